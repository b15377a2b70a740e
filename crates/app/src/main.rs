//! Entry point: logging, command-line flags, then hand over to the frame loop.

use anyhow::Result;
use asset::{SceneManifest, ShaderDialect};
use corelib::DemoSettings;
use platform::RunOptions;

fn parse_backend_arg(args: &[String]) -> wgpu::Backends {
    // Accept: --gpu-backend=auto|vulkan|dx12|metal|gl
    let mut backends = wgpu::Backends::all();
    for arg in args {
        if let Some(val) = arg.strip_prefix("--gpu-backend=") {
            backends = match val.to_ascii_lowercase().as_str() {
                "auto" => wgpu::Backends::all(),
                "vulkan" | "vk" => wgpu::Backends::VULKAN,
                "dx12" | "d3d12" => wgpu::Backends::DX12,
                "metal" | "mtl" => wgpu::Backends::METAL,
                "gl" | "opengl" | "gles" => wgpu::Backends::GL,
                other => {
                    log::warn!("Unknown backend '{other}', falling back to auto");
                    wgpu::Backends::all()
                }
            };
        }
    }
    backends
}

/// `--size=WxH`, `--width=`, `--height=`; later flags win.
fn parse_size_args(args: &[String], default: (u32, u32)) -> (u32, u32) {
    let (mut w, mut h) = default;
    for arg in args {
        if let Some(v) = arg.strip_prefix("--size=") {
            match v.split_once(['x', 'X']).map(|(a, b)| (a.parse::<u32>(), b.parse::<u32>())) {
                Some((Ok(pw), Ok(ph))) => (w, h) = (pw, ph),
                _ => log::warn!("Ignoring malformed --size='{v}' (expected WxH)"),
            }
        } else if let Some(v) = arg.strip_prefix("--width=") {
            match v.parse::<u32>() {
                Ok(pw) => w = pw,
                Err(_) => log::warn!("Ignoring malformed --width='{v}'"),
            }
        } else if let Some(v) = arg.strip_prefix("--height=") {
            match v.parse::<u32>() {
                Ok(ph) => h = ph,
                Err(_) => log::warn!("Ignoring malformed --height='{v}'"),
            }
        }
    }
    (w, h)
}

/// Last `--<name>=<value>` that parses as `T`.
fn parse_value_arg<T: std::str::FromStr>(args: &[String], name: &str) -> Option<T> {
    let prefix = format!("--{name}=");
    let mut out = None;
    for arg in args {
        if let Some(v) = arg.strip_prefix(prefix.as_str()) {
            match v.parse::<T>() {
                Ok(parsed) => out = Some(parsed),
                Err(_) => log::warn!("Ignoring malformed --{name}='{v}'"),
            }
        }
    }
    out
}

fn parse_run_options(args: &[String]) -> RunOptions {
    let mut settings = DemoSettings::default();
    let window = &mut settings.window;
    (window.width, window.height) = parse_size_args(args, (window.width, window.height));
    if let Some(fps) = parse_value_arg::<u32>(args, "fps") {
        settings.target_fps = fps;
    }
    if let Some(step) = parse_value_arg::<f32>(args, "step") {
        settings.camera_step = step;
    }

    let root = parse_value_arg::<String>(args, "assets").unwrap_or_else(|| ".".to_owned());
    let dialect = parse_value_arg::<ShaderDialect>(args, "shader-dialect")
        .unwrap_or_else(ShaderDialect::for_target);

    RunOptions {
        settings,
        manifest: SceneManifest::new(root, dialect),
        backends: parse_backend_arg(args),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = parse_run_options(&args);
    options.settings.validate()?;

    let window = &options.settings.window;
    log::info!(
        "Starting modelshader. Backend: {:?}, window_size={}x{}, target_fps={}, assets={}, dialect={}",
        options.backends,
        window.width,
        window.height,
        options.settings.target_fps,
        options.manifest.root.display(),
        options.manifest.dialect
    );

    platform::run_with_renderer(options)?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_flags_reproduce_the_stock_scene() {
        let opts = parse_run_options(&[]);
        assert_eq!(opts.settings, DemoSettings::default());
        assert_eq!(opts.backends, wgpu::Backends::all());
        assert_eq!(opts.manifest.root, std::path::PathBuf::from("."));
        assert_eq!(opts.manifest.dialect, ShaderDialect::for_target());
    }

    #[test]
    fn backend_aliases() {
        assert_eq!(parse_backend_arg(&args(&["--gpu-backend=vk"])), wgpu::Backends::VULKAN);
        assert_eq!(parse_backend_arg(&args(&["--gpu-backend=GL"])), wgpu::Backends::GL);
        assert_eq!(
            parse_backend_arg(&args(&["--gpu-backend=software"])),
            wgpu::Backends::all()
        );
    }

    #[test]
    fn size_flags_combine_and_later_wins() {
        let a = args(&["--size=1024x768"]);
        assert_eq!(parse_size_args(&a, (800, 450)), (1024, 768));

        let a = args(&["--size=1024X768", "--height=600"]);
        assert_eq!(parse_size_args(&a, (800, 450)), (1024, 600));

        let a = args(&["--width=640"]);
        assert_eq!(parse_size_args(&a, (800, 450)), (640, 450));
    }

    #[test]
    fn malformed_values_keep_defaults() {
        let a = args(&["--size=big", "--width=-3", "--fps=fast", "--step=x"]);
        assert_eq!(parse_size_args(&a, (800, 450)), (800, 450));
        let opts = parse_run_options(&a);
        assert_eq!(opts.settings.target_fps, 60);
        assert_eq!(opts.settings.camera_step, 0.1);
    }

    #[test]
    fn scene_flags() {
        let a = args(&[
            "--assets=/srv/demo",
            "--shader-dialect=embedded",
            "--fps=0",
            "--step=0.25",
        ]);
        let opts = parse_run_options(&a);
        assert_eq!(opts.manifest.root, std::path::PathBuf::from("/srv/demo"));
        assert_eq!(opts.manifest.dialect, ShaderDialect::Embedded);
        assert_eq!(opts.settings.target_fps, 0);
        assert_eq!(opts.settings.camera_step, 0.25);
        assert!(opts.settings.validate().is_ok());
    }

    #[test]
    fn zero_size_fails_validation() {
        let opts = parse_run_options(&args(&["--size=0x450"]));
        assert!(opts.settings.validate().is_err());
    }
}
