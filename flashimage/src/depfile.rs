use std::path::Path;

// Make treats spaces as separators and `$` as a variable reference.
fn escape(path: &Path) -> String {
    let text = path.to_string_lossy();
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            ' ' => out.push_str("\\ "),
            '#' => out.push_str("\\#"),
            '$' => out.push_str("$$"),
            _ => out.push(c),
        }
    }
    out
}

/// Render `target: dep dep ...` with one dependency per continuation line.
pub fn render<'a>(target: &Path, dependencies: impl IntoIterator<Item = &'a Path>) -> String {
    let mut out = format!("{}:", escape(target));
    for dependency in dependencies {
        out.push_str(" \\\n  ");
        out.push_str(&escape(dependency));
    }
    out.push('\n');
    out
}
