//! Worker process command lines.
//!
//! [`WorkerCommandBuilder`] is the seam between the job service and the
//! concrete downloader: production uses [`YtDlpCommand`], which runs yt-dlp
//! inside a long-lived docker container; tests substitute a shell command.

use tokio::process::Command;

/// Program, arguments, and a short human-readable label for one worker run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    /// Label used in log markers and error messages (e.g. `"yt-dlp"`).
    pub label: String,
    pub program: String,
    pub args: Vec<String>,
}

impl WorkerCommand {
    pub fn new(label: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Build the `tokio` command. Stdio wiring is left to the caller.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

/// Builds the worker command line for a validated download request.
pub trait WorkerCommandBuilder: Send + Sync {
    fn build(&self, source_url: &str, folder: &str) -> WorkerCommand;
}

// ---------------------------------------------------------------------------
// yt-dlp via docker exec
// ---------------------------------------------------------------------------

/// Default docker container running yt-dlp.
pub const DEFAULT_YTDLP_CONTAINER: &str = "yt-dlp-music";

/// Mount point of the music library inside the container.
pub const CONTAINER_MUSIC_ROOT: &str = "/music";

/// Runs `yt-dlp` inside a docker container, extracting best-quality mp3 audio
/// with embedded metadata into `<music root>/<folder>/`.
#[derive(Debug, Clone)]
pub struct YtDlpCommand {
    /// Docker CLI executable (`docker` unless overridden).
    pub docker_bin: String,
    /// Name of the running container that has yt-dlp installed.
    pub container: String,
    /// Music library root as seen from inside the container.
    pub container_music_root: String,
}

impl YtDlpCommand {
    pub fn new(docker_bin: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            docker_bin: docker_bin.into(),
            container: container.into(),
            container_music_root: CONTAINER_MUSIC_ROOT.to_string(),
        }
    }

    fn output_template(&self, folder: &str) -> String {
        format!(
            "{}/{folder}/%(artist,uploader)s - %(title)s.%(ext)s",
            self.container_music_root.trim_end_matches('/')
        )
    }
}

impl Default for YtDlpCommand {
    fn default() -> Self {
        Self::new("docker", DEFAULT_YTDLP_CONTAINER)
    }
}

impl WorkerCommandBuilder for YtDlpCommand {
    fn build(&self, source_url: &str, folder: &str) -> WorkerCommand {
        WorkerCommand::new("yt-dlp", &self.docker_bin)
            .args(["exec", "-i", self.container.as_str(), "yt-dlp"])
            .args(["--extractor-args", "youtube:player_client=android"])
            .args(["--retries", "10", "--fragment-retries", "10"])
            .args(["-x", "--audio-format", "mp3", "--audio-quality", "0"])
            .args(["--embed-metadata", "--embed-thumbnail"])
            .args(["--no-playlist", "--restrict-filenames", "--newline"])
            .arg("-o")
            .arg(self.output_template(folder))
            .arg(source_url)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ytdlp_command_targets_container_and_folder() {
        let builder = YtDlpCommand::new("docker", "my-ytdlp");
        let cmd = builder.build("https://youtu.be/abc123", "Jazz");

        assert_eq!(cmd.label, "yt-dlp");
        assert_eq!(cmd.program, "docker");
        assert_eq!(&cmd.args[..4], ["exec", "-i", "my-ytdlp", "yt-dlp"]);
        assert_eq!(cmd.args.last().map(String::as_str), Some("https://youtu.be/abc123"));

        let out_idx = cmd.args.iter().position(|a| a == "-o").expect("-o flag");
        assert_eq!(
            cmd.args[out_idx + 1],
            "/music/Jazz/%(artist,uploader)s - %(title)s.%(ext)s"
        );
        assert!(cmd.args.iter().any(|a| a == "--newline"));
        assert!(cmd.args.iter().any(|a| a == "--no-playlist"));
    }

    #[test]
    fn default_uses_docker_and_default_container() {
        let cmd = YtDlpCommand::default().build("https://youtu.be/x", "Rock");
        assert_eq!(cmd.program, "docker");
        assert_eq!(cmd.args[2], DEFAULT_YTDLP_CONTAINER);
    }

    #[test]
    fn builder_methods_append_in_order() {
        let cmd = WorkerCommand::new("sh", "sh").arg("-c").args(["echo hi"]);
        assert_eq!(cmd.args, vec!["-c", "echo hi"]);
    }
}
