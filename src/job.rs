//! Config-driven build.
//!
//! Runs everything a `qrthumb.toml` describes, in order:
//!
//! 1. The `[qr]` job, when present. Its output is typically the overlay of
//!    the thumbnails, so it is rendered first.
//! 2. One composition per `[[thumbnail.outputs]]` entry, sharing the
//!    background, overlay, caption and styling of `[thumbnail]`.
//!
//! Relative paths are resolved against `base_dir`, the directory holding
//! the config file. The first failure aborts the build.

use crate::config::{Config, ConfigError, resolve_path};
use crate::imaging::{
    BackendError, ComposeOutcome, ComposeRequest, ImageBackend, compose_thumbnail, generate_qr,
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Imaging(#[from] BackendError),
}

/// A QR code written by the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrOutput {
    pub path: PathBuf,
    pub size: (u32, u32),
}

#[derive(Debug, Default)]
pub struct BuildReport {
    pub qr: Option<QrOutput>,
    pub thumbnails: Vec<ComposeOutcome>,
}

/// Run the QR job and every thumbnail output of `config`.
pub fn run_build(
    backend: &impl ImageBackend,
    config: &Config,
    base_dir: &Path,
) -> Result<BuildReport, BuildError> {
    let mut report = BuildReport::default();

    if let Some(qr) = &config.qr {
        let path = resolve_path(base_dir, &qr.output);
        info!(output = %path.display(), "rendering QR code");
        let size = generate_qr(backend, &qr.data, &path, &qr.qr_config())?;
        report.qr = Some(QrOutput { path, size });
    }

    let thumbnail = &config.thumbnail;
    let background = resolve_path(base_dir, &thumbnail.background);
    let overlay = resolve_path(base_dir, &thumbnail.overlay);
    let mut compose = thumbnail.compose_config();
    compose.fonts = thumbnail
        .fonts
        .iter()
        .map(|font| resolve_path(base_dir, font))
        .collect();

    for entry in &thumbnail.outputs {
        let output = resolve_path(base_dir, &entry.path);
        let target = entry.target_size()?;
        info!(output = %output.display(), %target, "composing thumbnail");
        let outcome = compose_thumbnail(
            backend,
            &ComposeRequest {
                background: &background,
                overlay: &overlay,
                caption: &thumbnail.caption,
                output: &output,
                target,
            },
            &compose,
        )?;
        report.thumbnails.push(outcome);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputConfig, QrCodeConfig};
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use std::fs;
    use tempfile::TempDir;

    /// Config whose inputs are placeholder files inside `base`.
    fn config_with_inputs(base: &Path) -> Config {
        fs::create_dir_all(base.join("images")).unwrap();
        fs::write(base.join("images/background.jpeg"), b"x").unwrap();
        fs::write(base.join("qr.png"), b"x").unwrap();
        let mut config = Config::default();
        config.thumbnail.caption = "都心近郊の家事ラク ヘーベルメゾン".to_string();
        config
    }

    #[test]
    fn build_composes_every_output() {
        let tmp = TempDir::new().unwrap();
        let config = config_with_inputs(tmp.path());
        let backend = MockBackend::new();

        let report = run_build(&backend, &config, tmp.path()).unwrap();

        assert!(report.qr.is_none());
        let outputs: Vec<PathBuf> = report.thumbnails.iter().map(|t| t.output.clone()).collect();
        assert_eq!(
            outputs,
            vec![
                tmp.path().join("thumbnail_horizontal.png"),
                tmp.path().join("thumbnail_vertical.png"),
            ]
        );

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(
            &ops[1],
            RecordedOp::Compose { width: 720, height: 1280, overlay_edge: 240, .. }
        ));
    }

    #[test]
    fn build_renders_qr_before_thumbnails() {
        let tmp = TempDir::new().unwrap();
        let mut config = config_with_inputs(tmp.path());
        config.qr = Some(QrCodeConfig {
            data: "https://example.com/".to_string(),
            ..QrCodeConfig::default()
        });
        let backend = MockBackend::new();

        let report = run_build(&backend, &config, tmp.path()).unwrap();

        assert_eq!(
            report.qr,
            Some(QrOutput {
                path: tmp.path().join("qr.png"),
                size: (290, 290),
            })
        );
        let ops = backend.get_operations();
        assert_eq!(ops.len(), 3);
        assert!(matches!(&ops[0], RecordedOp::RenderQr { .. }));
    }

    #[test]
    fn build_resolves_paths_against_base_dir() {
        let tmp = TempDir::new().unwrap();
        let mut config = config_with_inputs(tmp.path());
        config.thumbnail.outputs = vec![OutputConfig {
            path: PathBuf::from("out/square.jpg"),
            width: 300,
            height: 300,
        }];
        let backend = MockBackend::new();

        run_build(&backend, &config, tmp.path()).unwrap();

        match &backend.get_operations()[0] {
            RecordedOp::Compose {
                background,
                overlay,
                output,
                ..
            } => {
                let expected = |p: &str| tmp.path().join(p).to_string_lossy().to_string();
                assert_eq!(*background, expected("images/background.jpeg"));
                assert_eq!(*overlay, expected("qr.png"));
                assert_eq!(*output, expected("out/square.jpg"));
            }
            other => panic!("unexpected op {other:?}"),
        }
    }

    #[test]
    fn build_stops_at_missing_input() {
        let tmp = TempDir::new().unwrap();
        let config = Config::default();
        let backend = MockBackend::new();

        let result = run_build(&backend, &config, tmp.path());

        assert!(matches!(
            result,
            Err(BuildError::Imaging(BackendError::FileNotFound(_)))
        ));
        assert!(backend.get_operations().is_empty());
    }
}
