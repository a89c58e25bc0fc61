//! ToonCrafter generative interpolation.
//!
//! ToonCrafter reads its sampling parameters from a YAML file. The file is
//! written as JSON, which every YAML 1.2 loader accepts.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::types::{ExternalCommand, InvokeError, InvokeRequest, InvokeResult};
use crate::models::GenerativeModelConfig;

pub const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Serialize)]
struct InferenceConfig<'a> {
    prompts: Vec<&'a str>,
    image_path_1: &'a Path,
    image_path_2: &'a Path,
    video_length: u32,
    width: u32,
    height: u32,
    fps: u32,
    use_ddpm: bool,
    steps: u32,
    seed: u64,
}

/// Write `config.yaml` into the job's work directory.
pub fn write_config(
    config: &GenerativeModelConfig,
    request: &InvokeRequest,
) -> InvokeResult<PathBuf> {
    let inference = InferenceConfig {
        prompts: vec![config.prompt.as_str()],
        image_path_1: &request.first,
        image_path_2: &request.second,
        video_length: config.video_length,
        width: config.width,
        height: config.height,
        fps: config.fps,
        use_ddpm: config.use_ddpm,
        steps: config.steps,
        seed: config.seed,
    };
    let content = serde_json::to_string_pretty(&inference)
        .map_err(|e| InvokeError::io("serializing inference config", e.into()))?;

    let path = config_path(request);
    fs::write(&path, content).map_err(|e| InvokeError::io("writing inference config", e))?;
    Ok(path)
}

/// `python inference.py ...` in the ToonCrafter checkout.
pub fn command(config: &GenerativeModelConfig, request: &InvokeRequest) -> ExternalCommand {
    ExternalCommand::new(&config.python)
        .arg("inference.py")
        .arg("--config")
        .arg(config_path(request).to_string_lossy())
        .arg("--savedir")
        .arg(request.output_dir.to_string_lossy())
        .arg("--ckpt")
        .arg(config.checkpoint_path.to_string_lossy())
        .arg("--bs")
        .arg("1")
        .arg("--seed")
        .arg(config.seed.to_string())
        .current_dir(&config.install_dir)
}

pub fn config_path(request: &InvokeRequest) -> PathBuf {
    request.work_dir.join(CONFIG_FILE)
}

/// `<output>/samples/sample_0/video.gif`.
pub fn artifact_path(request: &InvokeRequest) -> PathBuf {
    request
        .output_dir
        .join("samples")
        .join("sample_0")
        .join("video.gif")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config() -> GenerativeModelConfig {
        GenerativeModelConfig {
            install_dir: PathBuf::from("/opt/ToonCrafter"),
            checkpoint_path: PathBuf::from("/opt/ToonCrafter/checkpoints/model.ckpt"),
            prompt: "a cartoon animation".to_string(),
            steps: 50,
            seed: 42,
            video_length: 5,
            width: 512,
            height: 320,
            fps: 8,
            use_ddpm: false,
            python: "python3".to_string(),
        }
    }

    fn request(dir: &Path) -> InvokeRequest {
        InvokeRequest {
            first: dir.join("frame1.png"),
            second: dir.join("frame2.png"),
            work_dir: dir.to_path_buf(),
            output_dir: dir.join("output"),
        }
    }

    #[test]
    fn writes_inference_config() {
        let dir = tempdir().unwrap();
        let request = request(dir.path());

        let path = write_config(&config(), &request).unwrap();

        assert_eq!(path, dir.path().join("config.yaml"));
        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["prompts"][0], "a cartoon animation");
        assert_eq!(parsed["video_length"], 5);
        assert_eq!(parsed["use_ddpm"], false);
        assert_eq!(parsed["seed"], 42);
        assert_eq!(
            parsed["image_path_2"],
            dir.path().join("frame2.png").to_string_lossy().as_ref()
        );
    }

    #[test]
    fn builds_inference_invocation() {
        let request = request(Path::new("/tmp/job"));
        let cmd = command(&config(), &request);

        assert_eq!(cmd.args[0], "inference.py");
        assert_eq!(cmd.flag_value("--config"), Some("/tmp/job/config.yaml"));
        assert_eq!(cmd.flag_value("--savedir"), Some("/tmp/job/output"));
        assert_eq!(cmd.flag_value("--bs"), Some("1"));
        assert_eq!(cmd.flag_value("--seed"), Some("42"));
        assert_eq!(
            artifact_path(&request),
            PathBuf::from("/tmp/job/output/samples/sample_0/video.gif")
        );
    }
}
