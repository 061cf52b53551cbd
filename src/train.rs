// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// Training wrapper: drives the external `yolo` CLI, mirrors its output
// and emits machine-readable PROGRESS/METRICS lines for callers that
// babysit long runs.

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Command, Stdio};

// epoch rows start with "  12/100  " in the trainer's progress table
static EPOCH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)/(\d+)\s").expect("epoch regex"));

#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub data: PathBuf,
    pub model: String,
    pub epochs: u32,
    pub imgsz: u32,
    pub batch: u32,
    pub name: String,
    pub project: String,
    pub resume: bool,
    /// Trainer executable, normally `yolo` on PATH.
    pub yolo_bin: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochProgress {
    pub epoch: u32,
    pub total: u32,
}

impl EpochProgress {
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (self.epoch * 100 / self.total).min(100)
    }
}

/// Final validation metrics, printed as `METRICS:{json}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub precision: f64,
    pub recall: f64,
    pub map50: f64,
    pub map50_95: f64,
}

pub fn build_cli_args(config: &TrainConfig) -> Vec<String> {
    let mut args = vec![
        String::from("detect"),
        String::from("train"),
        format!("data={}", config.data.display()),
        format!("model={}", config.model),
        format!("epochs={}", config.epochs),
        format!("imgsz={}", config.imgsz),
        format!("batch={}", config.batch),
        format!("name={}", config.name),
        format!("project={}", config.project),
    ];
    if config.resume {
        args.push(String::from("resume=True"));
    }
    args
}

pub fn parse_epoch_line(line: &str) -> Option<EpochProgress> {
    let caps = EPOCH_RE.captures(line)?;
    let epoch: u32 = caps[1].parse().ok()?;
    let total: u32 = caps[2].parse().ok()?;
    if epoch == 0 || total == 0 || epoch > total {
        return None;
    }
    Some(EpochProgress { epoch, total })
}

/// The summary row the validator prints at the end of a run:
/// `all <images> <instances> <P> <R> <mAP50> <mAP50-95>`.
pub fn parse_metrics_line(line: &str) -> Option<Metrics> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 7 || fields[0] != "all" {
        return None;
    }
    Some(Metrics {
        precision: fields[3].parse().ok()?,
        recall: fields[4].parse().ok()?,
        map50: fields[5].parse().ok()?,
        map50_95: fields[6].parse().ok()?,
    })
}

/// Launch training and stream its stdout, echoing every line and
/// interleaving `PROGRESS:<pct>` / `METRICS:<json>` markers. Returns
/// the expected path of the best checkpoint.
pub fn run_training(config: &TrainConfig) -> Result<PathBuf> {
    if !config.data.is_file() {
        return Err(anyhow!("dataset config not found: {}", config.data.display()));
    }

    let args = build_cli_args(config);
    log::info!("launching {} {}", config.yolo_bin, args.join(" "));

    let mut child = Command::new(&config.yolo_bin)
        .args(&args)
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .with_context(|| {
            format!(
                "failed to launch `{}` (is the trainer installed and on PATH?)",
                config.yolo_bin
            )
        })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("no stdout handle on trainer child"))?;

    let mut last_percent = None;
    for line in BufReader::new(stdout).lines() {
        let line = line?;
        println!("{line}");

        if let Some(progress) = parse_epoch_line(&line) {
            let percent = progress.percent();
            if last_percent != Some(percent) {
                println!("PROGRESS:{percent}");
                last_percent = Some(percent);
            }
        }
        if let Some(metrics) = parse_metrics_line(&line) {
            println!("METRICS:{}", serde_json::to_string(&metrics)?);
        }
    }

    let status = child.wait().context("waiting for trainer")?;
    if !status.success() {
        return Err(anyhow!("trainer exited with {status}"));
    }

    Ok(PathBuf::from(&config.project)
        .join(&config.name)
        .join("weights")
        .join("best.pt"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TrainConfig {
        TrainConfig {
            data: PathBuf::from("dataset/data.yaml"),
            model: String::from("yolov8n.pt"),
            epochs: 100,
            imgsz: 640,
            batch: 16,
            name: String::from("text_detect"),
            project: String::from("runs/detect"),
            resume: false,
            yolo_bin: String::from("yolo"),
        }
    }

    #[test]
    fn cli_args_cover_every_setting() {
        let args = build_cli_args(&config());
        assert_eq!(args[0], "detect");
        assert_eq!(args[1], "train");
        assert!(args.contains(&String::from("data=dataset/data.yaml")));
        assert!(args.contains(&String::from("epochs=100")));
        assert!(args.contains(&String::from("imgsz=640")));
        assert!(args.contains(&String::from("batch=16")));
        assert!(args.contains(&String::from("project=runs/detect")));
        assert!(!args.iter().any(|a| a.starts_with("resume")));

        let mut resumed = config();
        resumed.resume = true;
        assert!(build_cli_args(&resumed).contains(&String::from("resume=True")));
    }

    #[test]
    fn recognizes_epoch_rows() {
        let progress =
            parse_epoch_line("      12/100      2.5G      1.214     0.8423      1.107        43        640").unwrap();
        assert_eq!(progress, EpochProgress { epoch: 12, total: 100 });
        assert_eq!(progress.percent(), 12);

        assert!(parse_epoch_line("Ultralytics 8.1.0 🚀 Python-3.10").is_none());
        assert!(parse_epoch_line("   0/100   ...").is_none());
        // image size mentions like "640/640" inside prose must not match
        assert!(parse_epoch_line("resized to 640/640 during warmup").is_none());
    }

    #[test]
    fn recognizes_validation_summary() {
        let metrics = parse_metrics_line(
            "                 all        128        929      0.643      0.537      0.605      0.446",
        )
        .unwrap();
        assert_eq!(metrics.precision, 0.643);
        assert_eq!(metrics.recall, 0.537);
        assert_eq!(metrics.map50, 0.605);
        assert_eq!(metrics.map50_95, 0.446);

        // per-class rows are skipped
        assert!(parse_metrics_line("      person        128        254      0.7      0.6      0.65      0.5").is_none());
        assert!(parse_metrics_line("all done").is_none());
    }
}
