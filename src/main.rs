use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use std::io::BufRead;
use std::path::{Path, PathBuf};

use shapecast::{
    canvas::Canvas,
    integrator::{render, MarchConfig, RenderConfig, RenderMode},
    interactive::{Control, Session},
    parser,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Sphere marching with lighting and shadows.
    March,

    /// Flat shaded analytic intersection.
    Trace,
}

impl From<Mode> for RenderMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::March => RenderMode::March,
            Mode::Trace => RenderMode::Trace,
        }
    }
}

/// Render a scene description to an image.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// The scene file to render.
    scene: PathBuf,

    /// Where to write the image.
    #[arg(short, long, default_value = "render.png")]
    output: PathBuf,

    #[arg(short, long, value_enum, default_value_t = Mode::March)]
    mode: Mode,

    /// Number of render threads, defaults to the number of cpus.
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Marching steps before a ray is treated as a miss.
    #[arg(long)]
    max_steps: Option<u32>,

    /// Marching distance before a ray is treated as a miss.
    #[arg(long)]
    max_dist: Option<f32>,

    /// Step length of the shadow test.
    #[arg(long)]
    shadow_step: Option<f32>,

    /// Print an ascii preview of each rendered frame.
    #[arg(long)]
    ascii: bool,

    /// Read movement keys from stdin and re-render after each one. Trace mode only.
    #[arg(long)]
    interactive: bool,
}

impl Args {
    fn config(&self) -> anyhow::Result<RenderConfig> {
        let mut march = MarchConfig::default();
        if let Some(steps) = self.max_steps {
            march = march.with_max_steps(steps);
        }
        if let Some(dist) = self.max_dist {
            march = march.with_max_dist(positive("--max-dist", dist)?);
        }
        if let Some(step) = self.shadow_step {
            march = march.with_shadow_step(positive("--shadow-step", step)?);
        }

        let mut config = RenderConfig::default()
            .with_mode(self.mode.into())
            .with_march(march);
        if let Some(jobs) = self.jobs {
            config = config.with_jobs(jobs);
        }
        Ok(config)
    }

    fn write(&self, canvas: &Canvas) -> anyhow::Result<()> {
        save(canvas, &self.output)?;
        if self.ascii {
            print!("{}", canvas.to_ascii());
        }
        Ok(())
    }
}

fn positive(flag: &str, value: f32) -> anyhow::Result<f32> {
    if !(value.is_finite() && value > 0.) {
        bail!("{} must be a positive length, got {}", flag, value);
    }
    Ok(value)
}

fn save(canvas: &Canvas, path: &Path) -> anyhow::Result<()> {
    canvas
        .save(path)
        .with_context(|| format!("failed to write image `{}`", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Args::parse();

    if args.interactive && matches!(args.mode, Mode::March) {
        bail!("--interactive needs --mode trace");
    }

    let config = args.config()?;
    let description = parser::parse_file(&args.scene)?;

    if !args.interactive {
        let canvas = render(&config, &description.info, &description.scene, &description.camera);
        return args.write(&canvas);
    }

    let mut session = Session::new(description, config)?;
    args.write(&session.render())?;

    for line in std::io::stdin().lock().lines() {
        let line = line.context("failed to read from stdin")?;
        let key = line.trim();
        if key.is_empty() {
            continue;
        }
        if key == "quit" {
            break;
        }

        match key.parse::<Control>() {
            Ok(control) => args.write(&session.apply(control))?,
            Err(err) => warn!("{}", err),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["shapecast", "scene.txt"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).expect("valid arguments")
    }

    #[test]
    fn test_march_settings() {
        let config = args(&["--max-steps", "7", "--max-dist", "12.5", "--shadow-step", "0.05"])
            .config()
            .expect("valid settings");
        assert_eq!(config.march.max_steps, 7);
        assert_eq!(config.march.max_dist, 12.5);
        assert_eq!(config.march.shadow_step, 0.05);
    }

    #[test]
    fn test_bad_lengths_are_rejected() {
        for value in ["0", "-0.5", "inf", "NaN"] {
            let step = format!("--shadow-step={}", value);
            let dist = format!("--max-dist={}", value);
            assert!(args(&[&step]).config().is_err(), "{}", value);
            assert!(args(&[&dist]).config().is_err(), "{}", value);
        }
    }

    #[test]
    fn test_jobs_are_at_least_one() {
        let config = args(&["-j", "0", "-m", "trace"]).config().expect("valid settings");
        assert_eq!(config.jobs, 1);
        assert_eq!(config.mode, RenderMode::Trace);
    }
}
