use crate::error::Result;
use crate::types::ScoredCandidate;
use std::path::Path;
use tokio::fs;

/// Default name of the provisioning file offered to the user.
pub const DEFAULT_FILENAME: &str = "sources.list";

const HEADER: &str = "# Generated by AOSC Mirror Service\n";

/// Channel qualifier appended to every declaration line when the
/// testing toggle is set.
const TESTING_TOKEN: &str = " explosive";

/// Render the ranked list as a sources.list. Pure: identical inputs
/// produce byte-identical output.
///
/// One block per mirror: a name comment, then its `deb` declaration.
/// Only the best-ranked declaration is active; the rest stay commented
/// out as hand-editable fallbacks. An empty list renders the header
/// alone.
pub fn render(ranked: &[ScoredCandidate], include_testing: bool) -> String {
    let mut out = String::from(HEADER);
    for (i, c) in ranked.iter().enumerate() {
        let prefix = if i == 0 { "" } else { "# " };
        out.push_str("# ");
        out.push_str(&c.name);
        out.push('\n');
        out.push_str(prefix);
        out.push_str("deb ");
        out.push_str(&c.url);
        if include_testing {
            out.push_str(TESTING_TOKEN);
        }
        out.push_str(" main\n#\n");
    }
    out
}

pub async fn write_list(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(name: &str, url: &str, score: f64) -> ScoredCandidate {
        ScoredCandidate {
            name: name.to_string(),
            url: url.to_string(),
            score,
            elapsed: std::time::Duration::from_millis(120),
        }
    }

    fn sample() -> Vec<ScoredCandidate> {
        vec![
            scored("Fastest", "https://fast.example.org/anthon/", 61.39),
            scored("Backup", "https://backup.example.org/anthon/", 122.0),
        ]
    }

    #[test]
    fn renders_first_active_and_rest_commented() {
        let text = render(&sample(), false);
        assert_eq!(
            text,
            "# Generated by AOSC Mirror Service\n\
             # Fastest\n\
             deb https://fast.example.org/anthon/ main\n\
             #\n\
             # Backup\n\
             # deb https://backup.example.org/anthon/ main\n\
             #\n"
        );
    }

    #[test]
    fn testing_toggle_qualifies_every_declaration() {
        let text = render(&sample(), true);
        assert!(text.contains("deb https://fast.example.org/anthon/ explosive main\n"));
        assert!(text.contains("# deb https://backup.example.org/anthon/ explosive main\n"));
    }

    #[test]
    fn render_is_byte_deterministic() {
        let ranked = sample();
        assert_eq!(render(&ranked, true), render(&ranked, true));
        assert_eq!(render(&ranked, false), render(&ranked, false));
    }

    #[test]
    fn empty_list_renders_header_only() {
        assert_eq!(render(&[], false), "# Generated by AOSC Mirror Service\n");
        assert_eq!(render(&[], true), "# Generated by AOSC Mirror Service\n");
    }

    #[tokio::test]
    async fn writes_list_to_disk() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(DEFAULT_FILENAME);

        let text = render(&sample(), false);
        write_list(&path, &text).await?;

        assert_eq!(fs::read_to_string(&path).await?, text);
        Ok(())
    }
}
