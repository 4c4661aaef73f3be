//! Heading-based document segmentation.

/// A run of markdown between two headings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Heading text, or the file label for content before the first heading.
    pub label: String,
    /// Heading line plus body, as written.
    pub text: String,
    /// Body without the heading line.
    pub body: String,
}

impl Section {
    fn new(label: String, heading: Option<&str>, body_lines: &[&str]) -> Self {
        let body = body_lines.join("\n").trim().to_string();
        let text = match heading {
            Some(h) if body.is_empty() => h.to_string(),
            Some(h) => format!("{}\n{}", h, body),
            None => body.clone(),
        };
        Self { label, text, body }
    }

    /// Length of the section text in characters, heading included.
    pub fn len(&self) -> usize {
        self.text.trim().chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }
}

/// True for a line opening or closing a fenced code block.
pub fn is_fence(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("```") || t.starts_with("~~~")
}

/// Heading text if the line is an ATX heading.
pub fn heading_text(line: &str) -> Option<&str> {
    let t = line.trim_start();
    let level = t.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &t[level..];
    if !rest.starts_with(' ') && !rest.starts_with('\t') {
        return None;
    }
    let text = rest.trim().trim_end_matches('#').trim();
    if text.is_empty() { None } else { Some(text) }
}

/// Split markdown at headings that are not inside fenced code.
///
/// Content before the first heading becomes a section labelled `file_label`.
/// Sections without any body are dropped.
pub fn split_sections(text: &str, file_label: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut label = file_label.to_string();
    let mut heading: Option<&str> = None;
    let mut body: Vec<&str> = Vec::new();
    let mut in_fence = false;

    for line in text.lines() {
        if is_fence(line) {
            in_fence = !in_fence;
        }
        if !in_fence {
            if let Some(h) = heading_text(line) {
                let section = Section::new(label, heading, &body);
                if !section.is_empty() {
                    sections.push(section);
                }
                label = h.to_string();
                heading = Some(line.trim());
                body.clear();
                continue;
            }
        }
        body.push(line);
    }

    let section = Section::new(label, heading, &body);
    if !section.is_empty() {
        sections.push(section);
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preamble_uses_file_label() {
        let doc = "Intro line about things.\n\n# First\nBody one\n## Second\nBody two";
        let sections = split_sections(doc, "USER.md");
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].label, "USER.md");
        assert_eq!(sections[0].body, "Intro line about things.");
        assert_eq!(sections[1].label, "First");
        assert_eq!(sections[2].label, "Second");
        assert_eq!(sections[2].text, "## Second\nBody two");
    }

    #[test]
    fn test_headings_inside_fences_do_not_split() {
        let doc = "# Setup\n```bash\n# install deps\nnpm ci\n```\nDone.";
        let sections = split_sections(doc, "TOOLS.md");
        assert_eq!(sections.len(), 1);
        assert!(sections[0].body.contains("# install deps"));
    }

    #[test]
    fn test_empty_sections_dropped() {
        let sections = split_sections("# Empty\n\n# Full\ncontent", "x.md");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].label, "Full");
    }

    #[test]
    fn test_heading_requires_space() {
        assert_eq!(heading_text("#hashtag"), None);
        assert_eq!(heading_text("### Projects ###"), Some("Projects"));
        assert_eq!(heading_text("####### too deep"), None);
    }

    #[test]
    fn test_len_counts_heading() {
        let sections = split_sections("## Role\n**Role:** Backend Engineer", "USER.md");
        assert_eq!(sections[0].len(), 34);
    }
}
