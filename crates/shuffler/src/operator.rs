//! Operator side of the host: join links, the clipboard, and the console.

use std::process::Stdio;
use std::str::FromStr;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;
use tracing::Level;

use crate::error::ParseCommandError;
use crate::{HostHandle, ShufflerError};

/// Path and query a join link carries after the public URL.
const JOIN_PATH: &str = "/shuffler/#/join?hostId=";

/// Printed when the failure to copy is reported.
pub const COPY_FAILED: &str = "Failed to copy join link to clipboard!";

// ---------------------------------------------------------------------------
// Join links
// ---------------------------------------------------------------------------

/// Builds the link a client opens to join `host_id`.
///
/// Returns an empty string while the host has no id yet.
///
/// ```rust
/// use shuffler::join_link;
///
/// assert_eq!(
///     join_link("https://cards.example.com/", Some("10.0.0.2:8080")),
///     "https://cards.example.com/shuffler/#/join?hostId=10.0.0.2:8080"
/// );
/// assert_eq!(join_link("https://cards.example.com", None), "");
/// ```
pub fn join_link(public_url: &str, host_id: Option<&str>) -> String {
    match host_id {
        Some(id) => format!("{}{JOIN_PATH}{id}", public_url.trim_end_matches('/')),
        None => String::new(),
    }
}

/// Extracts the host id from a join link.
///
/// Looks for a `hostId` query parameter anywhere in the link, so links
/// with extra parameters still work. Returns `None` if there is no
/// non-empty `hostId`.
pub fn parse_join_link(link: &str) -> Option<String> {
    let (_, query) = link.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "hostId")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

// ---------------------------------------------------------------------------
// Clipboard
// ---------------------------------------------------------------------------

/// Somewhere the operator can paste a join link from.
pub trait Clipboard {
    /// Places `text` on the clipboard.
    async fn copy(&self, text: &str) -> Result<(), ShufflerError>;
}

/// The desktop clipboard, reached through whichever helper is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    const TOOLS: &[(&str, &[&str])] = &[
        ("wl-copy", &[]),
        ("xclip", &["-selection", "clipboard"]),
        ("pbcopy", &[]),
    ];
}

impl Clipboard for SystemClipboard {
    async fn copy(&self, text: &str) -> Result<(), ShufflerError> {
        let mut last_error = String::from("no clipboard tool found");

        for &(program, args) in Self::TOOLS {
            let mut child = match Command::new(program)
                .args(args)
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
            {
                Ok(child) => child,
                Err(e) => {
                    tracing::debug!(program, error = %e, "clipboard tool unavailable");
                    continue;
                }
            };

            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(text.as_bytes()).await?;
            }
            let status = child.wait().await?;
            if status.success() {
                tracing::debug!(program, "copied to clipboard");
                return Ok(());
            }
            last_error = format!("{program} exited with {status}");
        }

        Err(ShufflerError::Clipboard(last_error))
    }
}

// ---------------------------------------------------------------------------
// Console
// ---------------------------------------------------------------------------

/// One line typed at the host console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorAction {
    /// Regenerate the deck and empty every hand.
    Reset,
    /// Return one in-use card of this type to the discard pile.
    Discard(String),
    /// Print the join link.
    Link,
    /// Copy the join link to the clipboard.
    Copy,
    /// Print the table status.
    Status,
    /// Print the operator log.
    Log,
    /// Print the command list.
    Help,
    /// Leave the console.
    Quit,
}

impl FromStr for OperatorAction {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        match word {
            "reset" => Ok(Self::Reset),
            "discard" if rest.is_empty() => Err(ParseCommandError::Usage("discard <card type>")),
            "discard" => Ok(Self::Discard(rest.to_string())),
            "link" => Ok(Self::Link),
            "copy" => Ok(Self::Copy),
            "status" => Ok(Self::Status),
            "log" => Ok(Self::Log),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(ParseCommandError::Unknown(other.to_string())),
        }
    }
}

/// Command list printed by `help`.
pub const OPERATOR_HELP: &str = "\
commands:
  reset             regenerate and reshuffle the deck, empty every hand
  discard <type>    return one in-use card of <type> to the discard pile
  link              print the join link
  copy              copy the join link to the clipboard
  status            show pile sizes, cards in use, and clients
  log               show the host log, newest first
  help              show this list
  quit              stop the host";

/// Runs the host console until `quit` or end of input.
///
/// Reads one command per line from `input` and writes results to `output`.
/// A rejected action prints its error; nothing else is affected.
pub async fn run_console<R, W, C>(
    host: &HostHandle,
    link: &str,
    clipboard: &C,
    input: R,
    mut output: W,
) -> Result<(), ShufflerError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    C: Clipboard,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let reply = match line.parse::<OperatorAction>() {
            Ok(OperatorAction::Quit) => break,
            Ok(action) => perform(host, link, clipboard, action).await?,
            Err(e) => format!("{e}\n{OPERATOR_HELP}"),
        };
        output.write_all(reply.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }

    Ok(())
}

/// Carries out one action and returns the text to show.
///
/// Only a stopped host is an error here; everything else becomes a reply.
async fn perform<C: Clipboard>(
    host: &HostHandle,
    link: &str,
    clipboard: &C,
    action: OperatorAction,
) -> Result<String, ShufflerError> {
    let reply = match action {
        OperatorAction::Reset => {
            let notified = host.reset().await?;
            format!("deck reset, {notified} clients notified")
        }
        OperatorAction::Discard(card_type) => match host.discard(card_type.as_str()).await {
            Ok(true) => format!("discarded one \"{card_type}\", discard pile reshuffled into draw pile"),
            Ok(false) => format!("discarded one \"{card_type}\""),
            Err(ShufflerError::HostUnavailable) => return Err(ShufflerError::HostUnavailable),
            Err(e) => format!("error: {e}"),
        },
        OperatorAction::Link if link.is_empty() => "no join link yet".to_string(),
        OperatorAction::Link => link.to_string(),
        OperatorAction::Copy => match clipboard.copy(link).await {
            Ok(()) => "join link copied".to_string(),
            Err(e) => {
                tracing::debug!(error = %e, "clipboard copy failed");
                host.note(Level::WARN, COPY_FAILED).await?;
                COPY_FAILED.to_string()
            }
        },
        OperatorAction::Status => host.status().await?.to_string(),
        OperatorAction::Log => host
            .logs()
            .await?
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"),
        OperatorAction::Help => OPERATOR_HELP.to_string(),
        OperatorAction::Quit => String::new(),
    };
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use shuffler_table::DeckTemplate;
    use tokio::io::BufReader;

    use super::*;
    use crate::HostConfig;
    use crate::host::spawn_host;

    const LINK: &str = "http://localhost:8080/shuffler/#/join?hostId=127.0.0.1:8080";

    /// A clipboard with no desktop behind it.
    struct BrokenClipboard;

    impl Clipboard for BrokenClipboard {
        async fn copy(&self, _text: &str) -> Result<(), ShufflerError> {
            Err(ShufflerError::Clipboard("no display".into()))
        }
    }

    /// Remembers everything copied to it.
    #[derive(Default)]
    struct RecordingClipboard(Mutex<Vec<String>>);

    impl Clipboard for RecordingClipboard {
        async fn copy(&self, text: &str) -> Result<(), ShufflerError> {
            self.0.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn host_with(pairs: &[(&str, u32)]) -> HostHandle {
        let config = HostConfig {
            deck: DeckTemplate::from_pairs(pairs.iter().copied()).unwrap(),
            seed: Some(3),
            ..HostConfig::default()
        };
        spawn_host(&config, None)
    }

    async fn console<C: Clipboard>(host: &HostHandle, clipboard: &C, script: &str) -> String {
        let mut output = Vec::new();
        run_console(
            host,
            LINK,
            clipboard,
            BufReader::new(script.as_bytes()),
            &mut output,
        )
        .await
        .unwrap();
        String::from_utf8(output).unwrap()
    }

    // =====================================================================
    // run_console
    // =====================================================================

    #[tokio::test]
    async fn test_console_failures_are_reported_and_change_nothing() {
        let host = host_with(&[("A", 1)]);
        let before = host.status().await.unwrap();

        let screen = console(
            &host,
            &BrokenClipboard,
            "discard A\ncopy\nstatus\nbogus\nquit\nreset\n",
        )
        .await;

        assert!(screen.contains("error: no \"A\" card is in use"));
        assert!(screen.contains(COPY_FAILED));
        assert!(screen.contains("cards in draw pile: 1"));
        assert!(screen.contains("unknown command: bogus"));
        // Nothing after `quit` runs.
        assert!(!screen.contains("deck reset"));

        let after = host.status().await.unwrap();
        assert_eq!(after, before);

        let logs = host.logs().await.unwrap();
        assert!(
            logs.iter()
                .any(|e| e.text == COPY_FAILED && e.level == Level::WARN)
        );
        assert!(logs.iter().any(|e| e.text.starts_with("Rejected discard:")));
    }

    #[tokio::test]
    async fn test_console_copy_link_and_reset() {
        let host = host_with(&[("A", 2)]);
        let clipboard = RecordingClipboard::default();

        let screen = console(&host, &clipboard, "link\ncopy\n\nreset\n").await;

        let lines: Vec<&str> = screen.lines().collect();
        assert_eq!(
            lines,
            vec![LINK, "join link copied", "deck reset, 0 clients notified"]
        );
        assert_eq!(*clipboard.0.lock().unwrap(), vec![LINK.to_string()]);
        assert_eq!(host.status().await.unwrap().draw_pile, 2);
        assert!(
            !host
                .logs()
                .await
                .unwrap()
                .iter()
                .any(|e| e.text == COPY_FAILED)
        );
    }

    #[tokio::test]
    async fn test_console_link_before_host_id() {
        let host = host_with(&[("A", 1)]);
        let mut output = Vec::new();

        run_console(
            &host,
            "",
            &RecordingClipboard::default(),
            BufReader::new(&b"link\n"[..]),
            &mut output,
        )
        .await
        .unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "no join link yet\n");
    }

    #[tokio::test]
    async fn test_console_reports_stopped_host() {
        let host = host_with(&[("A", 1)]);
        host.shutdown().await.unwrap();
        host.closed().await;

        let result = run_console(
            &host,
            LINK,
            &BrokenClipboard,
            BufReader::new(&b"status\n"[..]),
            Vec::new(),
        )
        .await;

        assert!(matches!(result, Err(ShufflerError::HostUnavailable)));
    }

    // =====================================================================
    // Links and parsing
    // =====================================================================

    #[test]
    fn test_join_link_shape() {
        assert_eq!(
            join_link("http://localhost:8080", Some("abc")),
            "http://localhost:8080/shuffler/#/join?hostId=abc"
        );
    }

    #[test]
    fn test_join_link_without_host_id_is_empty() {
        assert!(join_link("http://localhost:8080", None).is_empty());
    }

    #[test]
    fn test_parse_join_link_recovers_host_id() {
        let link = join_link("http://x.test", Some("127.0.0.1:9000"));
        assert_eq!(parse_join_link(&link).as_deref(), Some("127.0.0.1:9000"));
    }

    #[test]
    fn test_parse_join_link_with_extra_params() {
        let link = "http://x.test/shuffler/#/join?theme=dark&hostId=h1&x=y";
        assert_eq!(parse_join_link(link).as_deref(), Some("h1"));
    }

    #[test]
    fn test_parse_join_link_without_host_id() {
        assert_eq!(parse_join_link("http://x.test/shuffler/"), None);
        assert_eq!(parse_join_link("http://x.test/#/join?hostId="), None);
        assert_eq!(parse_join_link("http://x.test/#/join?other=1"), None);
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!("reset".parse::<OperatorAction>(), Ok(OperatorAction::Reset));
        assert_eq!("  status ".parse::<OperatorAction>(), Ok(OperatorAction::Status));
        assert_eq!(
            "discard Fire Ball".parse::<OperatorAction>(),
            Ok(OperatorAction::Discard("Fire Ball".into()))
        );
        assert_eq!("quit".parse::<OperatorAction>(), Ok(OperatorAction::Quit));
    }

    #[test]
    fn test_parse_discard_without_type_is_usage_error() {
        assert_eq!(
            "discard".parse::<OperatorAction>(),
            Err(ParseCommandError::Usage("discard <card type>"))
        );
    }

    #[test]
    fn test_parse_unknown_action() {
        assert_eq!(
            "shuffle".parse::<OperatorAction>(),
            Err(ParseCommandError::Unknown("shuffle".into()))
        );
    }
}
