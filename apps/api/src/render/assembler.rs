//! Document Assembler — maps ordered resume sections onto template fragments.
//!
//! One left-to-right pass over the sections builds an [`Outline`]: the header
//! plus markup-free blocks, each tagged with the fragment it feeds. The outline
//! is then rendered two ways over the same structure, so the typeset and the
//! fallback output always agree on what is shown:
//! - [`assemble`] → escaped LaTeX fragments for the template
//! - [`plain_text`] → formatting-free text for the fallback PDF encoder
//!
//! Fragment mapping:
//! - `personal-info` → `name` + `contact`
//! - `summary` → `summary`
//! - `experience`, `leadership`, `projects` → `experience`, in input order
//! - `education`, `certifications`, `awards` → `education`, always in that order
//! - `skills` → `skills`
//!
//! Every user-supplied string goes through [`escape`] on the LaTeX side;
//! headings, rules and list markup are inserted as raw LaTeX. Unknown sections
//! are skipped.

use tracing::debug;

use crate::models::resume::{
    AwardEntry, Bullet, CertificationEntry, EducationEntry, ExperienceEntry, PersonalInfo,
    ProjectEntry, Section, SectionContent, SectionKind, SkillCategory,
};
use crate::render::escape::{date_range, escape, join_non_empty};
use crate::render::template::TemplateFields;

/// Shown when no `personal-info` section supplies a name.
pub const DEFAULT_NAME: &str = "Your Name";

/// Vertical space between two entries of the same section.
const ENTRY_SEPARATOR: &str = "\\vspace{6pt}\n";
const CONTACT_SEPARATOR: &str = " \\textbullet{} ";
const LINE_BREAK: &str = "\\\\\n";
const PLAIN_CONTACT_SEPARATOR: &str = " | ";

// ────────────────────────────────────────────────────────────────────────────
// Renderings
// ────────────────────────────────────────────────────────────────────────────

/// Builds the template fields for `sections`.
pub fn assemble(sections: &[Section]) -> TemplateFields {
    let outline = Outline::build(sections);
    let mut fields = TemplateFields {
        name: outline
            .name
            .as_deref()
            .map(escape)
            .unwrap_or_else(|| DEFAULT_NAME.to_string()),
        contact: outline
            .contact
            .iter()
            .map(Contact::latex)
            .collect::<Vec<_>>()
            .join(CONTACT_SEPARATOR),
        ..TemplateFields::default()
    };

    for (slot, block) in &outline.blocks {
        let target = match slot {
            Slot::Summary => &mut fields.summary,
            Slot::Experience => &mut fields.experience,
            Slot::Skills => &mut fields.skills,
            Slot::Education | Slot::Certifications | Slot::Awards => &mut fields.education,
        };
        target.push_str(&block.latex());
    }
    fields
}

/// Formatting-free rendering of the resume: name, contact line, then one
/// upper-case titled block per section in fragment order (summary,
/// experience-like sections, skills, education, certifications, awards).
pub fn plain_text(sections: &[Section]) -> String {
    let outline = Outline::build(sections);
    let mut out = outline.name.unwrap_or_else(|| DEFAULT_NAME.to_string());

    let contact = outline
        .contact
        .iter()
        .map(Contact::plain)
        .collect::<Vec<_>>()
        .join(PLAIN_CONTACT_SEPARATOR);
    if !contact.is_empty() {
        out.push('\n');
        out.push_str(&contact);
    }

    for block in outline.blocks.iter().map(|(_, block)| block.plain()) {
        if !block.is_empty() {
            out.push_str("\n\n");
            out.push_str(&block);
        }
    }
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Outline
// ────────────────────────────────────────────────────────────────────────────

/// Destination fragment of a block. Declaration order is output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Slot {
    Summary,
    Experience,
    Skills,
    Education,
    Certifications,
    Awards,
}

/// Trimmed, unescaped content of a document.
struct Outline {
    name: Option<String>,
    contact: Vec<Contact>,
    blocks: Vec<(Slot, Block)>,
}

impl Outline {
    fn build(sections: &[Section]) -> Self {
        let mut outline = Outline {
            name: None,
            contact: Vec::new(),
            blocks: Vec::new(),
        };

        for section in sections {
            let (slot, kind, items) = match &section.content {
                SectionContent::PersonalInfo(info) => {
                    let name = info.full_name.trim();
                    if !name.is_empty() {
                        outline.name = Some(name.to_string());
                    }
                    outline.contact = contact_parts(info);
                    continue;
                }
                SectionContent::Summary(summary) => (
                    Slot::Summary,
                    SectionKind::Summary,
                    Items::Lines(vec![Line::Text(trimmed(summary.text()))]),
                ),
                SectionContent::Experience(entries) => (
                    Slot::Experience,
                    SectionKind::Experience,
                    Items::Entries(entries.iter().map(experience_entry).collect()),
                ),
                SectionContent::Leadership(entries) => (
                    Slot::Experience,
                    SectionKind::Leadership,
                    Items::Entries(entries.iter().map(experience_entry).collect()),
                ),
                SectionContent::Projects(entries) => (
                    Slot::Experience,
                    SectionKind::Projects,
                    Items::Entries(entries.iter().map(project_entry).collect()),
                ),
                SectionContent::Education(entries) => (
                    Slot::Education,
                    SectionKind::Education,
                    Items::Entries(entries.iter().map(education_entry).collect()),
                ),
                SectionContent::Certifications(entries) => (
                    Slot::Certifications,
                    SectionKind::Certifications,
                    Items::Lines(entries.iter().map(certification_line).collect()),
                ),
                SectionContent::Awards(entries) => (
                    Slot::Awards,
                    SectionKind::Awards,
                    Items::Lines(entries.iter().map(award_line).collect()),
                ),
                SectionContent::Skills(skills) => (
                    Slot::Skills,
                    SectionKind::Skills,
                    Items::Lines(skills.categories.iter().map(skill_line).collect()),
                ),
                SectionContent::Unknown(kind) => {
                    debug!("Skipping section {:?} of unknown type {kind:?}", section.id);
                    continue;
                }
            };
            outline.blocks.push((slot, Block { kind, items }));
        }

        // Stable, so sections sharing a slot keep their input order.
        outline.blocks.sort_by_key(|(slot, _)| *slot);
        outline
    }
}

enum Contact {
    Text(String),
    Email(String),
    Link { url: String, label: String },
}

impl Contact {
    fn latex(&self) -> String {
        match self {
            Contact::Text(text) => escape(text),
            Contact::Email(email) => href(&format!("mailto:{email}"), email),
            Contact::Link { url, label } => href(url, label),
        }
    }

    fn plain(&self) -> String {
        match self {
            Contact::Text(text) | Contact::Email(text) => text.clone(),
            Contact::Link { url, .. } => url.clone(),
        }
    }
}

struct Block {
    kind: SectionKind,
    items: Items,
}

/// Entries are multi-line blocks separated by vertical space; lines are
/// single rows joined by line breaks.
enum Items {
    Entries(Vec<Entry>),
    Lines(Vec<Line>),
}

impl Block {
    /// Heading plus rendered items. Empty if no item rendered anything.
    fn latex(&self) -> String {
        match &self.items {
            Items::Entries(entries) => {
                let blocks = non_empty(entries.iter().map(Entry::latex));
                if blocks.is_empty() {
                    return String::new();
                }
                heading(self.kind) + &blocks.join(ENTRY_SEPARATOR)
            }
            Items::Lines(lines) => {
                let lines = non_empty(lines.iter().map(Line::latex));
                if lines.is_empty() {
                    return String::new();
                }
                format!("{}{}\\par\n", heading(self.kind), lines.join(LINE_BREAK))
            }
        }
    }

    fn plain(&self) -> String {
        let items = match &self.items {
            Items::Entries(entries) => non_empty(entries.iter().map(Entry::plain)),
            Items::Lines(lines) => non_empty(lines.iter().map(Line::plain)),
        };
        if items.is_empty() {
            return String::new();
        }
        format!("{}\n{}", self.kind.heading().to_uppercase(), items.join("\n"))
    }
}

/// One piece of an entry row.
enum Cell {
    Text(String),
    /// Raw start and end; formatted by [`date_range`].
    Dates(String, String),
    Link(String),
}

impl Cell {
    fn text(value: &str) -> Self {
        Cell::Text(trimmed(value))
    }

    fn dates(start: &str, end: &str) -> Self {
        Cell::Dates(start.to_string(), end.to_string())
    }

    fn latex(&self) -> String {
        match self {
            Cell::Text(text) => escape(text),
            Cell::Dates(start, end) => escape(&date_range(start, end)),
            Cell::Link(url) if url.is_empty() => String::new(),
            Cell::Link(url) => href(url, url),
        }
    }

    fn plain(&self) -> String {
        match self {
            Cell::Text(text) | Cell::Link(text) => text.clone(),
            Cell::Dates(start, end) => date_range(start, end).replace(" -- ", " - "),
        }
    }
}

/// Two-row entry (`title`, `subtitle`, each left and right) with an optional
/// note and bullets.
struct Entry {
    title: [Cell; 2],
    subtitle: [Cell; 2],
    note: String,
    bullets: Vec<String>,
}

impl Entry {
    fn latex(&self) -> String {
        let mut lines = Vec::new();
        if let Some(line) = split_line(&self.title, "textbf", "textbf") {
            lines.push(line);
        }
        if let Some(line) = split_line(&self.subtitle, "textit", "textbf") {
            lines.push(line);
        }
        if !self.note.is_empty() {
            lines.push(format!("\\textit{{{}}}", escape(&self.note)));
        }

        let mut out = String::new();
        if !lines.is_empty() {
            out.push_str(&lines.join(LINE_BREAK));
            out.push_str("\\par\n");
        }
        if !self.bullets.is_empty() {
            out.push_str("\\begin{itemize}\\setlength{\\itemsep}{0pt}\n");
            for bullet in &self.bullets {
                out.push_str("  \\item ");
                out.push_str(&escape(bullet));
                out.push('\n');
            }
            out.push_str("\\end{itemize}\n");
        }
        out
    }

    fn plain(&self) -> String {
        let mut lines = vec![
            plain_row(&self.title),
            plain_row(&self.subtitle),
            self.note.clone(),
        ];
        lines.extend(self.bullets.iter().map(|bullet| format!("  - {bullet}")));
        lines.retain(|line| !line.is_empty());
        lines.join("\n")
    }
}

enum Line {
    Text(String),
    /// Certification or award: bold name, issuer, right-aligned date, note below.
    Credential {
        name: String,
        issuer: String,
        date: String,
        note: String,
    },
    /// Only rendered when at least one keyword is present.
    Skill { name: String, keywords: Vec<String> },
}

impl Line {
    fn latex(&self) -> String {
        match self {
            Line::Text(text) => escape(text),
            Line::Credential {
                name,
                issuer,
                date,
                note,
            } => {
                let mut line = match (name.as_str(), issuer.as_str()) {
                    ("", "") => return String::new(),
                    (name, "") => format!("\\textbf{{{}}}", escape(name)),
                    ("", issuer) => escape(issuer),
                    (name, issuer) => format!("\\textbf{{{}}}, {}", escape(name), escape(issuer)),
                };
                if !date.is_empty() {
                    line = format!("{line} \\hfill {}", escape(date));
                }
                if !note.is_empty() {
                    line = format!("{line}{LINE_BREAK}\\textit{{{}}}", escape(note));
                }
                line
            }
            Line::Skill { name, keywords } => {
                if keywords.is_empty() {
                    return String::new();
                }
                let keywords: Vec<String> = keywords.iter().map(|k| escape(k)).collect();
                format!("\\textbf{{{}}}: {}", escape(name), keywords.join(", "))
            }
        }
    }

    fn plain(&self) -> String {
        match self {
            Line::Text(text) => text.clone(),
            Line::Credential {
                name,
                issuer,
                date,
                note,
            } => {
                if name.is_empty() && issuer.is_empty() {
                    return String::new();
                }
                let line = join_non_empty([name.as_str(), issuer.as_str(), date.as_str()], ", ");
                if note.is_empty() {
                    line
                } else {
                    format!("{line}\n  {note}")
                }
            }
            Line::Skill { name, keywords } => {
                if keywords.is_empty() {
                    return String::new();
                }
                format!("{name}: {}", keywords.join(", "))
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Section → outline
// ────────────────────────────────────────────────────────────────────────────

/// Location, phone, email, then links; blanks skipped.
fn contact_parts(info: &PersonalInfo) -> Vec<Contact> {
    let mut parts = Vec::new();
    for text in [&info.location, &info.phone] {
        if !text.trim().is_empty() {
            parts.push(Contact::Text(trimmed(text)));
        }
    }
    if !info.email.trim().is_empty() {
        parts.push(Contact::Email(trimmed(&info.email)));
    }
    for link in &info.links {
        if !link.url().trim().is_empty() {
            parts.push(Contact::Link {
                url: trimmed(link.url()),
                label: trimmed(link.label()),
            });
        }
    }
    parts
}

fn experience_entry(entry: &ExperienceEntry) -> Entry {
    Entry {
        title: [Cell::text(&entry.company), Cell::text(&entry.location)],
        subtitle: [
            Cell::text(&entry.role),
            Cell::dates(&entry.start_date, &entry.end_date),
        ],
        note: entry.additional_role.as_deref().map(trimmed).unwrap_or_default(),
        bullets: bullet_texts(&entry.bullets),
    }
}

fn project_entry(entry: &ProjectEntry) -> Entry {
    Entry {
        title: [
            Cell::text(&entry.name),
            Cell::dates(&entry.start_date, &entry.end_date),
        ],
        subtitle: [Cell::text(&entry.technologies), Cell::Link(trimmed(&entry.link))],
        note: String::new(),
        bullets: bullet_texts(&entry.bullets),
    }
}

fn education_entry(entry: &EducationEntry) -> Entry {
    let gpa = entry
        .gpa
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(|g| format!("GPA: {g}"));
    let degree = join_non_empty([entry.degree.as_str(), gpa.as_deref().unwrap_or("")], ", ");
    Entry {
        title: [Cell::text(&entry.institution), Cell::text(&entry.location)],
        subtitle: [
            Cell::Text(degree),
            Cell::dates(&entry.start_date, &entry.end_date),
        ],
        note: entry.details.as_deref().map(trimmed).unwrap_or_default(),
        bullets: Vec::new(),
    }
}

fn certification_line(entry: &CertificationEntry) -> Line {
    Line::Credential {
        name: trimmed(&entry.name),
        issuer: trimmed(&entry.issuer),
        date: trimmed(&entry.date),
        note: String::new(),
    }
}

fn award_line(entry: &AwardEntry) -> Line {
    Line::Credential {
        name: trimmed(&entry.title),
        issuer: trimmed(&entry.issuer),
        date: trimmed(&entry.date),
        note: entry.description.as_deref().map(trimmed).unwrap_or_default(),
    }
}

fn skill_line(category: &SkillCategory) -> Line {
    Line::Skill {
        name: trimmed(&category.name),
        keywords: category
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

/// Non-blank bullet texts. Blank bullets never become empty items.
fn bullet_texts(bullets: &[Bullet]) -> Vec<String> {
    bullets
        .iter()
        .map(|b| b.text.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// LaTeX helpers
// ────────────────────────────────────────────────────────────────────────────

/// `\href{url}{label}`. The URL argument only needs `%` and `#` protected;
/// characters that would unbalance the argument are dropped.
fn href(url: &str, label: &str) -> String {
    let mut target = String::with_capacity(url.len());
    for c in url.chars() {
        match c {
            '%' => target.push_str("\\%"),
            '#' => target.push_str("\\#"),
            '\\' | '{' | '}' => {}
            c if c.is_whitespace() => {}
            c => target.push(c),
        }
    }
    format!("\\href{{{target}}}{{{}}}", escape(label))
}

fn heading(kind: SectionKind) -> String {
    format!(
        "\\vspace{{10pt}}\n\\textbf{{\\large {}}}\\\\[-8pt]\n\\rule{{\\linewidth}}{{0.6pt}}\\par\n",
        kind.heading()
    )
}

/// `\left{a} \hfill \right{b}`, or `None` when both sides are blank.
fn split_line([left, right]: &[Cell; 2], left_cmd: &str, right_cmd: &str) -> Option<String> {
    let (left, right) = (left.latex(), right.latex());
    match (left.is_empty(), right.is_empty()) {
        (true, true) => None,
        (false, true) => Some(format!("\\{left_cmd}{{{left}}}")),
        (true, false) => Some(format!("\\hfill \\{right_cmd}{{{right}}}")),
        (false, false) => Some(format!(
            "\\{left_cmd}{{{left}}} \\hfill \\{right_cmd}{{{right}}}"
        )),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Plain helpers
// ────────────────────────────────────────────────────────────────────────────

fn plain_row(cells: &[Cell; 2]) -> String {
    let parts: Vec<String> = cells.iter().map(Cell::plain).collect();
    join_non_empty(parts.iter().map(String::as_str), ", ")
}

fn non_empty(items: impl Iterator<Item = String>) -> Vec<String> {
    items.filter(|item| !item.is_empty()).collect()
}

fn trimmed(text: &str) -> String {
    text.trim().to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
