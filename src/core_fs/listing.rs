use chrono::{DateTime, Local};
use log::warn;
use std::fs::Metadata;
use std::path::Path;
use tokio::io::{AsyncWrite, AsyncWriteExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingFormat {
    /// NLST: one bare name per line.
    Names,
    /// LIST: `ls -l` style lines.
    Long,
}

/// Writes one `\r\n`-terminated line per non-hidden entry of `dir` into `out`.
///
/// Entries are sorted by name. Returns the number of entries written.
pub async fn write_listing<W>(out: &mut W, dir: &Path, format: ListingFormat) -> std::io::Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let mut entries = Vec::new();
    let mut read_dir = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let metadata = match entry.metadata().await {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!("Failed to get metadata for entry {:?}: {}", entry.path(), e);
                None
            }
        };
        entries.push((name, metadata));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut listing = String::new();
    for (name, metadata) in &entries {
        match (format, metadata) {
            (ListingFormat::Long, Some(metadata)) => {
                listing.push_str(&long_line(name, metadata));
            }
            _ => {
                listing.push_str(name);
                listing.push_str("\r\n");
            }
        }
    }

    out.write_all(listing.as_bytes()).await?;
    out.flush().await?;
    Ok(entries.len())
}

fn long_line(name: &str, metadata: &Metadata) -> String {
    let file_type = if metadata.is_dir() { 'd' } else { '-' };
    let date = metadata
        .modified()
        .map(|mtime| DateTime::<Local>::from(mtime).format("%b %d %H:%M").to_string())
        .unwrap_or_else(|_| "Jan 01 00:00".to_string());
    format!(
        "{}{} 1 ftp ftp {:>12} {} {}\r\n",
        file_type,
        permissions(metadata),
        metadata.len(),
        date,
        name
    )
}

#[cfg(unix)]
fn permissions(metadata: &Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;

    let mode = metadata.permissions().mode();
    let flags = ['r', 'w', 'x'];
    (0..9)
        .map(|bit| {
            if mode & (0o400 >> bit) != 0 {
                flags[bit % 3]
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(not(unix))]
fn permissions(metadata: &Metadata) -> String {
    if metadata.permissions().readonly() {
        "r--r--r--".to_string()
    } else {
        "rwxr-xr-x".to_string()
    }
}
