//! Path helpers for file paths reported by the probe tool.
//!
//! Paths come from text rather than from the local file system and may use
//! either `/` or `\` as separator, so `std::path::Path` is not used here.

/// The last component of `path`.
///
/// # Examples
///
/// ```
/// use ffscribe_probe::paths::file_name;
///
/// assert_eq!(file_name("/movies/anime/naruto.mp4"), "naruto.mp4");
/// assert_eq!(file_name("C:\\res\\movies\\naruto.mp4"), "naruto.mp4");
/// assert_eq!(file_name("naruto.mp4"), "naruto.mp4");
/// ```
pub fn file_name(path: &str) -> &str {
    path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(path)
}

/// The text after the last `.` of `file_name`, or `""` if there is none.
///
/// # Examples
///
/// ```
/// use ffscribe_probe::paths::extension;
///
/// assert_eq!(extension("naruto.mp4"), "mp4");
/// assert_eq!(extension("archive.tar.gz"), "gz");
/// assert_eq!(extension("README"), "");
/// ```
pub fn extension(file_name: &str) -> &str {
    file_name
        .rfind('.')
        .map(|at| &file_name[at + 1..])
        .unwrap_or("")
}
