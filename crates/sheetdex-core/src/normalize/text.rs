/// Line prefix declaring a mon's types, matched case-insensitively.
pub const TAG_PREFIX: &str = "type:";

/// Slug used when a name has no ASCII letters or digits.
pub const DEFAULT_SLUG: &str = "mon";

/// Lowercase `name` and collapse every run of non-alphanumerics into one `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.trim().to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_sep && !slug.is_empty() {
                slug.push('-');
            }
            pending_sep = false;
            slug.push(c);
        } else {
            pending_sep = true;
        }
    }

    if slug.is_empty() {
        DEFAULT_SLUG.to_string()
    } else {
        slug
    }
}

/// Split on `\n`, `\r\n` and lone `\r`. A trailing line break does not
/// produce an empty final line.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = Some(text);
    std::iter::from_fn(move || {
        let s = rest.filter(|s| !s.is_empty())?;
        match s.find(['\n', '\r']) {
            Some(i) => {
                let skip = if s[i..].starts_with("\r\n") { 2 } else { 1 };
                rest = Some(&s[i + skip..]);
                Some(&s[..i])
            }
            None => {
                rest = None;
                Some(s)
            }
        }
    })
}

fn is_tag_line(line: &str) -> bool {
    line.trim().to_lowercase().starts_with(TAG_PREFIX)
}

/// Collect the values of every `Type:` line. Values may be separated by `/` or `,`.
pub fn extract_tags(description: &str) -> Vec<String> {
    split_lines(description)
        .filter(|line| is_tag_line(line))
        .filter_map(|line| line.split_once(':'))
        .flat_map(|(_, values)| values.split(['/', ',']))
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// The description without its `Type:` lines.
pub fn strip_tag_lines(description: &str) -> String {
    split_lines(description)
        .filter(|line| !is_tag_line(line))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
