//! Slash-separated file name helpers.
//!
//! Engines key sources by name, not by `PathBuf`, so names are normalized
//! as strings: backslashes become `/`, `.` segments are dropped and `..`
//! segments fold into their parent where one exists.

pub fn root_length(name: &str) -> usize {
    let bytes = name.as_bytes();
    if bytes.first() == Some(&b'/') {
        if bytes.get(1) != Some(&b'/') {
            return 1;
        }
        // `//server/` is the root of a UNC name.
        return match name[2..].find('/') {
            Some(index) => index + 3,
            None => 2,
        };
    }
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        return if bytes.get(2) == Some(&b'/') { 3 } else { 2 };
    }
    0
}

pub fn is_rooted(name: &str) -> bool {
    root_length(name) > 0
}

pub fn normalize(name: &str) -> String {
    let name = name.replace('\\', "/");
    let (root, rest) = name.split_at(root_length(&name));
    let mut parts: Vec<&str> = Vec::new();
    for part in rest.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(last) if *last != ".." => {
                    parts.pop();
                }
                _ if root.is_empty() => parts.push(".."),
                _ => {}
            },
            _ => parts.push(part),
        }
    }
    format!("{root}{}", parts.join("/"))
}

/// Directory portion of `name`, or `""` for a bare file name.
pub fn directory_of(name: &str) -> &str {
    let root = root_length(name);
    match name.rfind('/') {
        Some(index) => &name[..index.max(root)],
        None => &name[..root],
    }
}

pub fn file_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

pub fn combine(directory: &str, relative: &str) -> String {
    if directory.is_empty() || is_rooted(relative) {
        return normalize(relative);
    }
    if directory.ends_with('/') || root_length(directory) == directory.len() {
        normalize(&format!("{directory}{relative}"))
    } else {
        normalize(&format!("{directory}/{relative}"))
    }
}
