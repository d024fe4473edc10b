//! Template Engine — loads a LaTeX skeleton and fills its placeholders.
//!
//! Lookup never fails: the named template, then `default.tex` from the same
//! directory, then the embedded [`MINIMAL_TEMPLATE`].

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, warn};

pub const DEFAULT_TEMPLATE_ID: &str = "default";

/// Last-resort template compiled into the binary. Uses only the article class
/// so it typesets on a bare TeX installation.
pub const MINIMAL_TEMPLATE: &str = r"\documentclass[11pt]{article}
\usepackage[margin=0.75in]{geometry}
\usepackage[hidelinks]{hyperref}
\pagestyle{empty}
\setlength{\parindent}{0pt}
\begin{document}
\begin{center}
{\LARGE\textbf{{{NAME}}}}\\[4pt]
{{CONTACT}}
\end{center}
{{SUMMARY}}
{{EXPERIENCE}}
{{SKILLS}}
{{EDUCATION}}
\end{document}
";

/// The fixed set of tokens `populate` knows how to fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Name,
    Contact,
    Summary,
    Experience,
    Skills,
    Education,
}

impl Placeholder {
    pub const ALL: [Placeholder; 6] = [
        Placeholder::Name,
        Placeholder::Contact,
        Placeholder::Summary,
        Placeholder::Experience,
        Placeholder::Skills,
        Placeholder::Education,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            Placeholder::Name => "{{NAME}}",
            Placeholder::Contact => "{{CONTACT}}",
            Placeholder::Summary => "{{SUMMARY}}",
            Placeholder::Experience => "{{EXPERIENCE}}",
            Placeholder::Skills => "{{SKILLS}}",
            Placeholder::Education => "{{EDUCATION}}",
        }
    }
}

/// Fragments produced by the assembler, already valid LaTeX.
/// An empty field renders as nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateFields {
    pub name: String,
    pub contact: String,
    pub summary: String,
    pub experience: String,
    pub skills: String,
    pub education: String,
}

impl TemplateFields {
    pub fn get(&self, placeholder: Placeholder) -> &str {
        match placeholder {
            Placeholder::Name => &self.name,
            Placeholder::Contact => &self.contact,
            Placeholder::Summary => &self.summary,
            Placeholder::Experience => &self.experience,
            Placeholder::Skills => &self.skills,
            Placeholder::Education => &self.education,
        }
    }
}

/// Replaces every known placeholder with its fragment.
///
/// Works in one left-to-right scan so that text inserted for one placeholder
/// is never searched again; a fragment that happens to contain `{{SKILLS}}`
/// stays literal. Unknown `{{...}}` tokens are copied through untouched.
pub fn populate(template: &str, fields: &TemplateFields) -> String {
    let mut out = String::with_capacity(template.len() + 1024);
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        match Placeholder::ALL
            .iter()
            .find(|p| candidate.starts_with(p.token()))
        {
            Some(placeholder) => {
                out.push_str(fields.get(*placeholder));
                rest = &candidate[placeholder.token().len()..];
            }
            None => {
                // Advance one brace only: `{{{NAME}}}` must still match at the next offset.
                out.push('{');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Reads templates from a directory of `<id>.tex` files.
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    dir: PathBuf,
}

impl TemplateEngine {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the template source for `template_id`, falling back to the
    /// stored default and then to [`MINIMAL_TEMPLATE`].
    pub async fn load(&self, template_id: &str) -> String {
        if template_id != DEFAULT_TEMPLATE_ID {
            if let Some(source) = self.read(template_id).await {
                return source;
            }
            warn!("Template {template_id:?} not found, using default");
        }

        if let Some(source) = self.read(DEFAULT_TEMPLATE_ID).await {
            return source;
        }

        warn!(
            "Default template unreadable in {}, using embedded minimal template",
            self.dir.display()
        );
        MINIMAL_TEMPLATE.to_string()
    }

    async fn read(&self, template_id: &str) -> Option<String> {
        if !is_valid_template_id(template_id) {
            warn!("Rejected template id {template_id:?}");
            return None;
        }
        let path = self.dir.join(format!("{template_id}.tex"));
        match tokio::fs::read_to_string(&path).await {
            Ok(source) => {
                debug!("Loaded template from {}", path.display());
                Some(source)
            }
            Err(e) => {
                debug!("Template {} unavailable: {e}", path.display());
                None
            }
        }
    }
}

/// Ids are file stems: ASCII alphanumerics, `-` and `_`, at most 64 chars.
fn is_valid_template_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
