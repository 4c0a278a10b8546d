//! Management banner: stamping, detection and removal
//!
//! Every file written by a sync starts with a banner carrying [`TAG`]. A file
//! is considered managed as long as the tag appears anywhere in its content,
//! so small formatting drift in the banner never orphans a file.

use std::path::Path;

/// Greppable marker identifying managed files
pub const TAG: &str = "@vendorism";

/// Human readable explanation placed next to the tag
pub const DESCRIPTION: &str =
    "This file is managed by vendorism. Local edits are lost on the next sync unless saved as a patch or the file is ejected.";

/// Comment syntax used to render the banner for a file type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerStyle {
    /// `/** ... */` block comment
    Block,
    /// `#` line comments
    Hash,
    /// `<!-- ... -->` markup comment
    Html,
    /// `{# ... #}` template comment
    Jinja,
    /// `{{!-- ... --}}` template comment
    Handlebars,
}

impl BannerStyle {
    /// Every style, in the order used when looking for a banner to strip
    pub const ALL: [Self; 5] = [
        Self::Block,
        Self::Hash,
        Self::Html,
        Self::Jinja,
        Self::Handlebars,
    ];

    /// Select the style for a path by its extension
    #[must_use]
    pub fn for_path(path: &str) -> Self {
        let extension = Path::new(path)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase());

        match extension.as_deref() {
            Some("sh" | "bash" | "zsh" | "py" | "rb" | "yaml" | "yml" | "toml") => Self::Hash,
            Some("html" | "htm" | "xml" | "svg" | "vue" | "svelte" | "md") => Self::Html,
            Some("njk" | "jinja" | "jinja2" | "j2") => Self::Jinja,
            Some("hbs" | "handlebars" | "mustache") => Self::Handlebars,
            _ => Self::Block,
        }
    }

    /// Render the banner text for this style
    #[must_use]
    pub fn text(self) -> String {
        match self {
            Self::Block => format!("/**\n * {TAG}\n * {DESCRIPTION}\n */\n"),
            Self::Hash => format!("# {TAG}\n# {DESCRIPTION}\n"),
            Self::Html => format!("<!--\n  {TAG}\n  {DESCRIPTION}\n-->\n"),
            Self::Jinja => format!("{{#\n  {TAG}\n  {DESCRIPTION}\n#}}\n"),
            Self::Handlebars => format!("{{{{!--\n  {TAG}\n  {DESCRIPTION}\n--}}}}\n"),
        }
    }
}

/// Check whether content carries the management tag
#[must_use]
#[inline]
pub fn has_banner(content: &str) -> bool {
    content.contains(TAG)
}

/// Banner selection for a sync, honouring an optional override
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Banner {
    override_text: Option<String>,
}

impl Banner {
    /// Create a banner set, optionally replacing every variant with `override_text`
    #[must_use]
    pub const fn new(override_text: Option<String>) -> Self {
        Self { override_text }
    }

    /// Banner text to stamp on `path`
    #[must_use]
    pub fn banner_for(&self, path: &str) -> String {
        self.override_text
            .clone()
            .unwrap_or_else(|| BannerStyle::for_path(path).text())
    }

    /// Prepend the banner unless the content already carries the tag
    #[must_use]
    pub fn apply(&self, content: &str, path: &str) -> String {
        if has_banner(content) {
            return content.to_owned();
        }

        if self.override_text.is_none()
            && is_markdown(path)
            && let Some(rest) = strip_front_matter_fence(content)
        {
            // Front matter must stay the first block of the document
            return format!("---\n{}{rest}", BannerStyle::Hash.text());
        }

        format!("{}{content}", self.banner_for(path))
    }

    /// Remove the first occurrence of the banner from content
    ///
    /// Known banner texts are tried first, in both line ending flavours. A
    /// tag written some other way (by a transform, say) is removed together
    /// with the lines carrying it. Returns `None` only when the tag is absent.
    #[must_use]
    pub fn strip(&self, content: &str, path: &str) -> Option<String> {
        if !has_banner(content) {
            return None;
        }

        let stripped = self
            .strip_known(content, path)
            .unwrap_or_else(|| content.to_owned());

        // Any leftover tag would keep the file managed
        if has_banner(&stripped) {
            return Some(strip_tag_lines(&stripped));
        }
        Some(stripped)
    }

    fn strip_known(&self, content: &str, path: &str) -> Option<String> {
        let candidates: Vec<String> = match self.override_text.as_ref() {
            Some(text) => vec![text.clone()],
            None => {
                let preferred = BannerStyle::for_path(path);
                std::iter::once(preferred)
                    .chain(BannerStyle::ALL.into_iter().filter(|style| *style != preferred))
                    .map(BannerStyle::text)
                    .collect()
            }
        };

        candidates
            .iter()
            .flat_map(|text| [text.clone(), text.replace('\n', "\r\n")])
            .find(|text| content.contains(text.as_str()))
            .map(|text| content.replacen(text.as_str(), "", 1))
    }
}

/// Drop every line containing the tag, keeping the other lines verbatim
fn strip_tag_lines(content: &str) -> String {
    content
        .split_inclusive('\n')
        .filter(|line| !line.contains(TAG))
        .collect()
}

fn is_markdown(path: &str) -> bool {
    Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

fn strip_front_matter_fence(content: &str) -> Option<&str> {
    content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
}
