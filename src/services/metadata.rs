// src/services/metadata.rs

//! Repository metadata loading.
//!
//! A feed is an RPM repository tree: `repodata/repomd.xml` lists the
//! metadata files, and the `primary` file holds one `<package>` element per
//! built package. Only the fields needed to compare repositories are kept.

use std::io::Read;

use async_trait::async_trait;
use flate2::read::MultiGzDecoder;
use quick_xml::events::{BytesCData, BytesStart, Event};
use quick_xml::reader::Reader;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::PackageRecord;
use crate::utils::http::fetch_bytes;
use crate::utils::{feed_base, resolve_location};

/// Magic bytes for gzip compressed files.
pub const GZIP_MAGIC_BYTES: [u8; 2] = [0x1f, 0x8b];

/// Magic bytes for Zstandard compressed files.
pub const ZST_MAGIC_BYTES: [u8; 4] = [0x28, 0xb5, 0x2f, 0xfd];

/// Magic bytes for xz compressed files.
pub const XZ_MAGIC_BYTES: [u8; 6] = [0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00];

/// Epoch assumed when a package does not declare one.
pub const DEFAULT_EPOCH: &str = "0";

/// Source of package records for a feed URL.
#[async_trait]
pub trait MetadataLoader: Send + Sync {
    /// Load every package record advertised by the feed at `url`.
    ///
    /// Fails with [`AppError::MetadataLoad`] on transport or parse errors.
    async fn load(&self, url: &str) -> Result<Vec<PackageRecord>>;
}

/// Checksum advertised for a metadata file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Checksum {
    /// Algorithm name (e.g., "sha256")
    pub algorithm: String,

    /// Hex digest
    pub value: String,
}

/// One `<data>` entry of `repomd.xml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoMdEntry {
    /// Metadata kind (e.g., "primary", "filelists")
    pub kind: String,

    /// Checksum of the compressed file
    pub checksum: Option<Checksum>,

    /// Location relative to the feed base
    pub location: Option<String>,
}

/// Loads feeds over HTTP from `repomd.xml` and the primary metadata file.
#[derive(Clone)]
pub struct RepomdLoader {
    client: Client,
}

impl RepomdLoader {
    /// Create a loader sharing the given HTTP client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetch and parse `repodata/repomd.xml` of a feed.
    pub async fn repomd(&self, base: &Url) -> Result<Vec<RepoMdEntry>> {
        let url = resolve_location(base, "repodata/repomd.xml")?;
        log::debug!("Fetching {}", url);
        let xml = fetch_bytes(&self.client, url).await?;
        parse_repomd(&xml)
    }

    /// Checksum of the primary metadata file of a feed, if it lists one.
    pub async fn primary_checksum(&self, url: &str) -> Result<Option<Checksum>> {
        let base = feed_base(url)?;
        let entries = self.repomd(&base).await?;
        Ok(entries
            .into_iter()
            .find(|entry| entry.kind == "primary")
            .and_then(|entry| entry.checksum))
    }

    async fn load_feed(&self, url: &str) -> Result<Vec<PackageRecord>> {
        let base = feed_base(url)?;
        let entries = self.repomd(&base).await?;

        let location = entries
            .into_iter()
            .find(|entry| entry.kind == "primary")
            .and_then(|entry| entry.location)
            .ok_or_else(|| AppError::metadata_load(url, "repomd.xml lists no primary metadata"))?;

        let primary_url = resolve_location(&base, &location)?;
        log::debug!("Fetching {}", primary_url);
        let bytes = fetch_bytes(&self.client, primary_url).await?;

        // Decompression and parsing are CPU bound
        tokio::task::spawn_blocking(move || {
            let xml = decompress(bytes)?;
            parse_primary(&xml)
        })
        .await
        .map_err(|e| AppError::metadata_load(url, e))?
    }
}

#[async_trait]
impl MetadataLoader for RepomdLoader {
    async fn load(&self, url: &str) -> Result<Vec<PackageRecord>> {
        self.load_feed(url).await.map_err(|e| match e {
            AppError::MetadataLoad { .. } => e,
            other => AppError::metadata_load(url, other),
        })
    }
}

/// Decompress metadata according to its magic bytes.
///
/// Gzip and zstd are decoded; anything else is assumed to be plain XML.
pub fn decompress(bytes: Vec<u8>) -> Result<Vec<u8>> {
    if bytes.starts_with(&GZIP_MAGIC_BYTES) {
        let mut xml = Vec::new();
        MultiGzDecoder::new(bytes.as_slice()).read_to_end(&mut xml)?;
        Ok(xml)
    } else if bytes.starts_with(&ZST_MAGIC_BYTES) {
        Ok(zstd::decode_all(bytes.as_slice())?)
    } else if bytes.starts_with(&XZ_MAGIC_BYTES) {
        Err(AppError::validation("xz compressed metadata is not supported"))
    } else {
        Ok(bytes)
    }
}

fn attribute(element: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    match element
        .try_get_attribute(name)
        .map_err(quick_xml::Error::from)?
    {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

fn cdata_text(data: &BytesCData<'_>) -> Result<String> {
    std::str::from_utf8(data)
        .map(str::to_string)
        .map_err(|e| AppError::validation(format!("CDATA is not valid UTF-8: {e}")))
}

/// Parse `repomd.xml` into its data entries.
pub fn parse_repomd(xml: &[u8]) -> Result<Vec<RepoMdEntry>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut entries = Vec::new();
    let mut current: Option<RepoMdEntry> = None;
    let mut checksum_algorithm: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"data" => {
                    current = Some(RepoMdEntry {
                        kind: attribute(&e, "type")?.unwrap_or_default(),
                        ..RepoMdEntry::default()
                    });
                }
                b"checksum" if current.is_some() => {
                    checksum_algorithm = Some(attribute(&e, "type")?.unwrap_or_default());
                }
                b"location" => {
                    if let Some(entry) = current.as_mut() {
                        entry.location = attribute(&e, "href")?;
                    }
                }
                _ => {}
            },
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"location" {
                    if let Some(entry) = current.as_mut() {
                        entry.location = attribute(&e, "href")?;
                    }
                }
            }
            Event::Text(t) => {
                if let (Some(entry), Some(algorithm)) = (current.as_mut(), checksum_algorithm.take())
                {
                    entry.checksum = Some(Checksum {
                        algorithm,
                        value: t.unescape()?.trim().to_string(),
                    });
                }
            }
            Event::CData(t) => {
                if let (Some(entry), Some(algorithm)) = (current.as_mut(), checksum_algorithm.take())
                {
                    entry.checksum = Some(Checksum {
                        algorithm,
                        value: cdata_text(&t)?.trim().to_string(),
                    });
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"data" => entries.extend(current.take()),
                b"checksum" => checksum_algorithm = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

#[derive(Debug, Clone, Copy)]
enum TextField {
    Name,
    Arch,
}

#[derive(Debug, Default)]
struct PartialPackage {
    name: String,
    epoch: Option<String>,
    version: String,
    release: String,
    arch: String,
}

impl PartialPackage {
    fn read_version(&mut self, element: &BytesStart<'_>) -> Result<()> {
        self.epoch = attribute(element, "epoch")?;
        self.version = attribute(element, "ver")?.unwrap_or_default();
        self.release = attribute(element, "rel")?.unwrap_or_default();
        Ok(())
    }

    fn set_text(&mut self, field: TextField, text: &str) {
        let text = text.trim().to_string();
        match field {
            TextField::Name => self.name = text,
            TextField::Arch => self.arch = text,
        }
    }

    /// Complete the record; every field except the epoch is required.
    fn finish(self) -> Result<PackageRecord> {
        let epoch = self
            .epoch
            .filter(|epoch| !epoch.is_empty())
            .unwrap_or_else(|| DEFAULT_EPOCH.to_string());
        let record = PackageRecord::new(self.name, epoch, self.version, self.release, self.arch);

        let missing = [
            ("name", &record.name),
            ("arch", &record.architecture),
            ("version", &record.version),
            ("release", &record.release),
        ]
        .into_iter()
        .find(|(_, value)| value.is_empty());
        match missing {
            Some((field, _)) => Err(AppError::validation(format!(
                "package {} in primary metadata has no {}",
                record.identity(),
                field
            ))),
            None => Ok(record),
        }
    }
}

/// Parse a primary metadata document into package records.
///
/// Only `<package type="rpm">` elements (or ones without a type) are read,
/// and only their direct `<name>`, `<arch>` and `<version>` children; the
/// nested `<format>` block is skipped. A package missing any of those fields
/// fails the whole document.
pub fn parse_primary(xml: &[u8]) -> Result<Vec<PackageRecord>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut skip_buf = Vec::new();
    let mut records = Vec::new();
    let mut current: Option<PartialPackage> = None;
    let mut field: Option<TextField> = None;
    // Element depth below the current <package>
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                if let Some(pkg) = current.as_mut() {
                    depth += 1;
                    if depth == 1 {
                        match e.local_name().as_ref() {
                            b"name" => field = Some(TextField::Name),
                            b"arch" => field = Some(TextField::Arch),
                            b"version" => pkg.read_version(&e)?,
                            _ => {}
                        }
                    }
                } else if e.local_name().as_ref() == b"package" {
                    match attribute(&e, "type")?.as_deref() {
                        None | Some("rpm") => {
                            current = Some(PartialPackage::default());
                            depth = 0;
                        }
                        Some(other) => {
                            log::debug!("Skipping package of type {}", other);
                            reader.read_to_end_into(e.name(), &mut skip_buf)?;
                            skip_buf.clear();
                        }
                    }
                }
            }
            Event::Empty(e) => {
                if let Some(pkg) = current.as_mut() {
                    if depth == 0 && e.local_name().as_ref() == b"version" {
                        pkg.read_version(&e)?;
                    }
                }
            }
            Event::Text(t) => {
                if let (Some(pkg), Some(which)) = (current.as_mut(), field) {
                    pkg.set_text(which, &t.unescape()?);
                }
            }
            Event::CData(t) => {
                if let (Some(pkg), Some(which)) = (current.as_mut(), field) {
                    pkg.set_text(which, &cdata_text(&t)?);
                }
            }
            Event::End(_) => {
                if current.is_some() {
                    if depth == 0 {
                        if let Some(pkg) = current.take() {
                            records.push(pkg.finish()?);
                        }
                    } else {
                        depth -= 1;
                        field = None;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const REPOMD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<repomd xmlns="http://linux.duke.edu/metadata/repo" xmlns:rpm="http://linux.duke.edu/metadata/rpm">
  <revision>1700000000</revision>
  <data type="primary">
    <checksum type="sha256">aaaa1111</checksum>
    <open-checksum type="sha256">bbbb2222</open-checksum>
    <location href="repodata/aaaa1111-primary.xml.gz"/>
    <timestamp>1700000000</timestamp>
  </data>
  <data type="filelists">
    <checksum type="sha256">cccc3333</checksum>
    <location href="repodata/cccc3333-filelists.xml.gz"/>
  </data>
</repomd>"#;

    const PRIMARY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata xmlns="http://linux.duke.edu/metadata/common" xmlns:rpm="http://linux.duke.edu/metadata/rpm" packages="2">
<package type="rpm">
  <name>bash</name>
  <arch>x86_64</arch>
  <version epoch="0" ver="5.1.8" rel="6.el9"/>
  <checksum type="sha256" pkgid="YES">dead</checksum>
  <summary>The GNU Bourne Again shell</summary>
  <format>
    <rpm:license>GPLv3+</rpm:license>
    <rpm:provides>
      <rpm:entry name="bash" flags="EQ" epoch="0" ver="5.1.8" rel="6.el9"/>
      <rpm:entry name="config(bash)" flags="EQ" epoch="0" ver="5.1.8" rel="6.el9"/>
    </rpm:provides>
    <file>/usr/bin/bash</file>
  </format>
</package>
<package type="rpm">
  <name>tzdata</name>
  <arch>noarch</arch>
  <version ver="2024a" rel="1"/>
  <format>
    <rpm:sourcerpm>tzdata-2024a-1.src.rpm</rpm:sourcerpm>
  </format>
</package>
</metadata>"#;

    #[test]
    fn test_parse_repomd() {
        let entries = parse_repomd(REPOMD.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, "primary");
        assert_eq!(
            entries[0].checksum,
            Some(Checksum {
                algorithm: "sha256".into(),
                value: "aaaa1111".into(),
            })
        );
        assert_eq!(
            entries[0].location.as_deref(),
            Some("repodata/aaaa1111-primary.xml.gz")
        );
        assert_eq!(entries[1].kind, "filelists");
    }

    #[test]
    fn test_parse_primary() {
        let records = parse_primary(PRIMARY.as_bytes()).unwrap();
        assert_eq!(
            records,
            vec![
                PackageRecord::new("bash", "0", "5.1.8", "6.el9", "x86_64"),
                PackageRecord::new("tzdata", "0", "2024a", "1", "noarch"),
            ]
        );
    }

    #[test]
    fn test_parse_primary_empty_document() {
        let xml = r#"<metadata packages="0"></metadata>"#;
        assert!(parse_primary(xml.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_parse_primary_rejects_broken_xml() {
        let xml = "<metadata><package><name>bash</arch></package></metadata>";
        assert!(parse_primary(xml.as_bytes()).is_err());
    }

    #[test]
    fn test_parse_primary_rejects_package_without_arch() {
        let xml = r#"<metadata packages="1">
<package type="rpm">
  <name>bash</name>
  <version epoch="0" ver="5.1" rel="1"/>
</package>
</metadata>"#;
        let err = parse_primary(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("arch")));
    }

    #[test]
    fn test_parse_primary_rejects_package_without_version() {
        let xml = r#"<metadata><package type="rpm"><name>bash</name><arch>x86_64</arch></package></metadata>"#;
        assert!(parse_primary(xml.as_bytes()).is_err());
    }

    #[test]
    fn test_parse_primary_skips_non_rpm_packages() {
        let xml = r#"<metadata packages="2">
<package type="deb">
  <name>dpkg-only</name>
  <arch>amd64</arch>
  <version ver="1.0" rel="1"/>
  <format><file>/usr/bin/dpkg-only</file></format>
</package>
<package>
  <name>zsh</name>
  <arch>x86_64</arch>
  <version epoch="1" ver="5.9" rel="2"/>
</package>
</metadata>"#;
        let records = parse_primary(xml.as_bytes()).unwrap();
        assert_eq!(
            records,
            vec![PackageRecord::new("zsh", "1", "5.9", "2", "x86_64")]
        );
    }

    #[test]
    fn test_parse_primary_reads_cdata() {
        let xml = r#"<metadata><package type="rpm">
  <name><![CDATA[bash]]></name>
  <arch><![CDATA[x86_64]]></arch>
  <version ver="5.1" rel="1"/>
</package></metadata>"#;
        let records = parse_primary(xml.as_bytes()).unwrap();
        assert_eq!(
            records,
            vec![PackageRecord::new("bash", "0", "5.1", "1", "x86_64")]
        );
    }

    #[test]
    fn test_parse_repomd_location_pair_and_cdata_checksum() {
        let xml = r#"<repomd>
  <data type="primary">
    <checksum type="sha256"><![CDATA[aaaa1111]]></checksum>
    <location href="repodata/primary.xml.zst"></location>
  </data>
</repomd>"#;
        let entries = parse_repomd(xml.as_bytes()).unwrap();
        assert_eq!(
            entries[0].location.as_deref(),
            Some("repodata/primary.xml.zst")
        );
        assert_eq!(
            entries[0].checksum.as_ref().map(|c| c.value.as_str()),
            Some("aaaa1111")
        );
    }

    #[test]
    fn test_decompress_gzip() {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(PRIMARY.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let xml = decompress(compressed).unwrap();
        assert_eq!(parse_primary(&xml).unwrap().len(), 2);
    }

    #[test]
    fn test_decompress_zstd() {
        let compressed = zstd::encode_all(PRIMARY.as_bytes(), 0).unwrap();
        let xml = decompress(compressed).unwrap();
        assert_eq!(xml, PRIMARY.as_bytes());
    }

    #[test]
    fn test_decompress_plain_passthrough() {
        let xml = decompress(PRIMARY.as_bytes().to_vec()).unwrap();
        assert_eq!(xml, PRIMARY.as_bytes());
    }
}
