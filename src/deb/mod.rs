// src/deb/mod.rs

//! Debian package archive codec
//!
//! A .deb is an AR archive with three members: a `debian-binary` format
//! marker, a `control.tar` with package metadata, and a `data.tar` with the
//! installed payload. `unpack` splits a package into a working directory
//! (payload at the root, control metadata under [`CONTROL_DIR`]); `pack`
//! rebuilds a valid .deb from such a directory.

use crate::error::{Error, Result};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use tar::{Archive, EntryType};
use tracing::debug;
use xz2::read::XzDecoder;

/// Subdirectory of an unpacked package holding the control metadata.
pub const CONTROL_DIR: &str = "control-meta";

/// Unpack a .deb archive.
///
/// The payload lands in `dest_dir` and the control metadata in
/// `dest_dir/control-meta`. Creates `dest_dir` and its subtree.
pub fn unpack(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    debug!(
        "Unpacking {} into {}",
        archive_path.display(),
        dest_dir.display()
    );

    let mut file = File::open(archive_path)
        .map_err(|e| Error::Extraction(format!("failed to open {}: {}", archive_path.display(), e)))?;

    // AR magic: "!<arch>\n"
    let mut magic = [0u8; 8];
    file.read_exact(&mut magic)
        .map_err(|e| Error::Extraction(format!("failed to read {}: {}", archive_path.display(), e)))?;
    if magic[0..7] != *b"!<arch>" {
        return Err(Error::Extraction(format!(
            "{} is not a Debian package archive",
            archive_path.display()
        )));
    }
    file.seek(SeekFrom::Start(0))
        .map_err(|e| Error::Extraction(format!("failed to rewind archive: {}", e)))?;

    fs::create_dir_all(dest_dir)
        .map_err(|e| Error::Extraction(format!("failed to create {}: {}", dest_dir.display(), e)))?;
    let control_dir = dest_dir.join(CONTROL_DIR);

    let mut archive = ar::Archive::new(file);
    let mut saw_control = false;
    let mut saw_data = false;

    while let Some(entry) = archive.next_entry() {
        let mut entry =
            entry.map_err(|e| Error::Extraction(format!("failed to read AR entry: {}", e)))?;
        let name = String::from_utf8_lossy(entry.header().identifier()).to_string();

        if name.starts_with("debian-binary") {
            let mut version = String::new();
            entry
                .read_to_string(&mut version)
                .map_err(|e| Error::Extraction(format!("failed to read debian-binary: {}", e)))?;
            if !version.starts_with("2.") {
                return Err(Error::Extraction(format!(
                    "unsupported package format version: {}",
                    version.trim()
                )));
            }
        } else if name.starts_with("control.tar") {
            let mut data = Vec::new();
            entry
                .read_to_end(&mut data)
                .map_err(|e| Error::Extraction(format!("failed to read {}: {}", name, e)))?;
            extract_tar(&name, &data, &control_dir)?;
            saw_control = true;
        } else if name.starts_with("data.tar") {
            let mut data = Vec::new();
            entry
                .read_to_end(&mut data)
                .map_err(|e| Error::Extraction(format!("failed to read {}: {}", name, e)))?;
            extract_tar(&name, &data, dest_dir)?;
            saw_data = true;
        } else {
            debug!("Skipping unknown archive member: {}", name);
        }
    }

    if !saw_control || !saw_data {
        return Err(Error::Extraction(format!(
            "{} is missing a control.tar or data.tar member",
            archive_path.display()
        )));
    }

    Ok(())
}

/// Build a .deb archive from an unpacked working directory.
///
/// Expects the control metadata under `source_dir/control-meta`; everything
/// else under `source_dir` becomes the payload. Members are owned by
/// root/root, entries are ordered lexicographically, and mtimes come from
/// the source files, so repacking an unchanged tree is deterministic.
/// Overwrites any existing file at `archive_path`.
pub fn pack(source_dir: &Path, archive_path: &Path) -> Result<()> {
    debug!(
        "Packing {} into {}",
        source_dir.display(),
        archive_path.display()
    );

    let control_dir = source_dir.join(CONTROL_DIR);
    if !control_dir.is_dir() {
        return Err(Error::Archive(format!(
            "{} has no {} directory",
            source_dir.display(),
            CONTROL_DIR
        )));
    }

    let mtime = fs::metadata(source_dir)
        .map_err(|e| Error::Archive(format!("failed to stat {}: {}", source_dir.display(), e)))?
        .mtime() as u64;

    let control_tar = build_tar(&control_dir, None)
        .map_err(|e| Error::Archive(format!("failed to build control.tar: {}", e)))?;
    let data_tar = build_tar(source_dir, Some(OsStr::new(CONTROL_DIR)))
        .map_err(|e| Error::Archive(format!("failed to build data.tar: {}", e)))?;

    let control_gz = gzip(&control_tar)?;
    let data_gz = gzip(&data_tar)?;

    let file = File::create(archive_path)
        .map_err(|e| Error::Archive(format!("failed to create {}: {}", archive_path.display(), e)))?;
    let mut builder = ar::Builder::new(BufWriter::new(file));

    // Format-version member first, then control, then data.
    append_ar_member(&mut builder, "debian-binary", b"2.0\n", mtime)?;
    append_ar_member(&mut builder, "control.tar.gz", &control_gz, mtime)?;
    append_ar_member(&mut builder, "data.tar.gz", &data_gz, mtime)?;

    let mut writer = builder
        .into_inner()
        .map_err(|e| Error::Archive(format!("failed to finish archive: {}", e)))?;
    writer
        .flush()
        .map_err(|e| Error::Archive(format!("failed to flush {}: {}", archive_path.display(), e)))?;

    Ok(())
}

/// Append a single AR member with the given identifier, contents, and
/// modification time. Fixing the mtime keeps `pack` output deterministic.
fn append_ar_member<W: Write>(
    builder: &mut ar::Builder<W>,
    name: &str,
    data: &[u8],
    mtime: u64,
) -> Result<()> {
    let mut header = ar::Header::new(name.as_bytes().to_vec(), data.len() as u64);
    header.set_mtime(mtime);
    builder
        .append(&header, data)
        .map_err(|e| Error::Archive(format!("failed to append ar member {}: {}", name, e)))?;
    Ok(())
}

/// Compute the SHA-256 digest of a file as a lowercase hex string.
pub fn file_sha256(path: &Path) -> Result<String> {
    use sha2::{Digest, Sha256};

    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;

    Ok(format!("{:x}", hasher.finalize()))
}

/// Decompress and extract a control.tar or data.tar member.
fn extract_tar(member_name: &str, data: &[u8], dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)
        .map_err(|e| Error::Extraction(format!("failed to create {}: {}", dest.display(), e)))?;

    let reader = tar_reader(member_name, data)?;
    let mut archive = Archive::new(reader);
    archive
        .unpack(dest)
        .map_err(|e| Error::Extraction(format!("failed to unpack {}: {}", member_name, e)))?;

    Ok(())
}

/// Pick a decompressor from the member name suffix.
fn tar_reader<'a>(member_name: &str, data: &'a [u8]) -> Result<Box<dyn Read + 'a>> {
    let name = member_name.trim_end_matches('/');

    if name.ends_with(".gz") {
        Ok(Box::new(GzDecoder::new(data)))
    } else if name.ends_with(".xz") {
        Ok(Box::new(XzDecoder::new(data)))
    } else if name.ends_with(".zst") {
        let decoder = zstd::Decoder::new(data)
            .map_err(|e| Error::Extraction(format!("failed to create zstd decoder: {}", e)))?;
        Ok(Box::new(decoder))
    } else if name.ends_with(".tar") {
        Ok(Box::new(data))
    } else {
        Err(Error::Extraction(format!(
            "unsupported compression for member {}",
            member_name
        )))
    }
}

/// Build an uncompressed tarball of `root`, dpkg-style: a leading "./"
/// entry, then every path under it, sorted. `skip` names a top-level
/// directory to leave out (the control metadata when building data.tar).
fn build_tar(root: &Path, skip: Option<&OsStr>) -> Result<Vec<u8>> {
    let mut builder = tar::Builder::new(Vec::new());

    let root_meta = fs::metadata(root)?;
    let mut header = dir_header(&root_meta)?;
    builder.append_data(&mut header, "./", io::empty())?;

    append_dir_entries(&mut builder, root, Path::new("."), skip)?;

    Ok(builder.into_inner()?)
}

fn append_dir_entries<W: Write>(
    builder: &mut tar::Builder<W>,
    dir: &Path,
    rel: &Path,
    skip: Option<&OsStr>,
) -> Result<()> {
    let mut entries = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let name = entry.file_name();
        if rel == Path::new(".") && Some(name.as_os_str()) == skip {
            continue;
        }

        let path = entry.path();
        let rel_path = rel.join(&name);
        let meta = fs::symlink_metadata(&path)?;

        if meta.is_dir() {
            let mut header = dir_header(&meta)?;
            builder.append_data(&mut header, &rel_path, io::empty())?;
            append_dir_entries(builder, &path, &rel_path, skip)?;
        } else if meta.file_type().is_symlink() {
            let target = fs::read_link(&path)?;
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(EntryType::Symlink);
            header.set_size(0);
            header.set_mode(0o777);
            header.set_mtime(meta.mtime() as u64);
            set_root_owner(&mut header)?;
            builder.append_link(&mut header, &rel_path, &target)?;
        } else {
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(EntryType::Regular);
            header.set_size(meta.len());
            header.set_mode(meta.mode() & 0o7777);
            header.set_mtime(meta.mtime() as u64);
            set_root_owner(&mut header)?;
            let mut file = File::open(&path)?;
            builder.append_data(&mut header, &rel_path, &mut file)?;
        }
    }

    Ok(())
}

fn dir_header(meta: &fs::Metadata) -> Result<tar::Header> {
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(EntryType::Directory);
    header.set_size(0);
    header.set_mode(meta.mode() & 0o7777);
    header.set_mtime(meta.mtime() as u64);
    set_root_owner(&mut header)?;
    Ok(header)
}

fn set_root_owner(header: &mut tar::Header) -> Result<()> {
    header.set_uid(0);
    header.set_gid(0);
    header.set_username("root")?;
    header.set_groupname("root")?;
    Ok(())
}

fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| Error::Archive(format!("failed to compress member: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| Error::Archive(format!("failed to finish compression: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Lay out a minimal unpacked package: a control file plus a payload.
    fn make_package_tree(root: &Path) {
        let control_dir = root.join(CONTROL_DIR);
        fs::create_dir_all(&control_dir).unwrap();
        fs::write(
            control_dir.join("control"),
            "Package: com.example.tweak\nVersion: 1.0\nArchitecture: iphoneos-arm\n",
        )
        .unwrap();

        let lib_dir = root.join("Library/MobileSubstrate/DynamicLibraries");
        fs::create_dir_all(&lib_dir).unwrap();
        fs::write(lib_dir.join("Tweak.dylib"), b"\xca\xfe\xba\xbebinary").unwrap();
        fs::write(lib_dir.join("Tweak.plist"), b"{ Filter = {}; }").unwrap();

        let script = control_dir.join("postinst");
        fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_pack_unpack_round_trip() {
        let src = tempfile::tempdir().unwrap();
        make_package_tree(src.path());

        let deb_path = src.path().join("out.deb");
        pack(src.path(), &deb_path).unwrap();
        assert!(deb_path.exists());

        let dest = tempfile::tempdir().unwrap();
        unpack(&deb_path, dest.path()).unwrap();

        let control = fs::read_to_string(dest.path().join(CONTROL_DIR).join("control")).unwrap();
        assert!(control.contains("Package: com.example.tweak"));

        let payload = dest
            .path()
            .join("Library/MobileSubstrate/DynamicLibraries/Tweak.dylib");
        assert_eq!(fs::read(payload).unwrap(), b"\xca\xfe\xba\xbebinary");

        // The maintainer script keeps its exec bit through the round trip
        let script_mode = fs::metadata(dest.path().join(CONTROL_DIR).join("postinst"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(script_mode & 0o111, 0o111);
    }

    #[test]
    fn test_member_layout_and_order() {
        let src = tempfile::tempdir().unwrap();
        make_package_tree(src.path());

        let deb_path = src.path().join("out.deb");
        pack(src.path(), &deb_path).unwrap();

        let mut archive = ar::Archive::new(File::open(&deb_path).unwrap());
        let mut names = Vec::new();
        while let Some(entry) = archive.next_entry() {
            let entry = entry.unwrap();
            names.push(String::from_utf8_lossy(entry.header().identifier()).to_string());
        }
        assert_eq!(names, ["debian-binary", "control.tar.gz", "data.tar.gz"]);
    }

    #[test]
    fn test_pack_is_deterministic() {
        let src = tempfile::tempdir().unwrap();
        make_package_tree(src.path());

        let out = tempfile::tempdir().unwrap();
        let first = out.path().join("a.deb");
        let second = out.path().join("b.deb");
        pack(src.path(), &first).unwrap();
        pack(src.path(), &second).unwrap();

        assert_eq!(fs::read(first).unwrap(), fs::read(second).unwrap());
    }

    #[test]
    fn test_unpack_rejects_non_archive() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.deb");
        fs::write(&bogus, b"definitely not an ar archive").unwrap();

        let result = unpack(&bogus, &dir.path().join("out"));
        assert!(matches!(result, Err(Error::Extraction(_))));
    }

    #[test]
    fn test_pack_requires_control_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("stray"), b"payload only").unwrap();

        let result = pack(dir.path(), &dir.path().join("out.deb"));
        assert!(matches!(result, Err(Error::Archive(_))));
    }

    #[test]
    fn test_file_sha256() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data");
        fs::write(&path, b"abc").unwrap();

        assert_eq!(
            file_sha256(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
