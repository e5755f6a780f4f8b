//! Local file names for downloaded resources

use url::Url;

/// Build a filesystem-safe file name from a resource title and the
/// extension of its transfer location.
///
/// Every character of the title that is not an ASCII letter or digit
/// becomes `_`. The extension comes from the last path segment of the URL
/// (query and fragment ignored); without one the name has no extension.
pub fn local_filename(title: &str, download_url: &str) -> String {
    let mut stem: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if stem.is_empty() {
        stem.push_str("download");
    }

    match url_extension(download_url) {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}

fn url_extension(download_url: &str) -> Option<String> {
    let segment = match Url::parse(download_url) {
        Ok(url) => url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(|s| s.to_string())?,
        Err(_) => {
            let path = download_url.split(['?', '#']).next().unwrap_or_default();
            path.rsplit('/').next().unwrap_or_default().to_string()
        }
    };

    let segment = urlencoding::decode(&segment)
        .map(|s| s.into_owned())
        .unwrap_or(segment);

    let (name, ext) = segment.rsplit_once('.')?;
    if name.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_sanitized_and_extension_kept() {
        assert_eq!(
            local_filename("KCSE Maths 2019 (Paper 1)", "https://x/papers/a.pdf"),
            "KCSE_Maths_2019__Paper_1_.pdf"
        );
    }

    #[test]
    fn query_and_encoding_are_ignored() {
        assert_eq!(
            local_filename("Notes", "https://storage.example/o/notes%2Fbio.docx?alt=media&token=abc"),
            "Notes.docx"
        );
    }

    #[test]
    fn no_extension_in_url() {
        assert_eq!(local_filename("Notes", "https://x/download"), "Notes");
        assert_eq!(local_filename("Notes", "https://x/"), "Notes");
        assert_eq!(local_filename("Notes", "https://x/.hidden"), "Notes");
    }

    #[test]
    fn non_ascii_titles_and_relative_urls() {
        assert_eq!(local_filename("Kiswahili – Insha", "files/insha.pdf"), "Kiswahili___Insha.pdf");
        assert_eq!(local_filename("", "https://x/a.pdf"), "download.pdf");
    }
}
