//! On-disk fixtures: checkpoints and zipped model bundles.
//!
//! Pickled checkpoints are written with the handful of protocol 2 opcodes
//! `torch.save` emits for a flat state dict.

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use safetensors::tensor::TensorView;
use sha1::{Digest, Sha1};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A file to place in a zip archive.
#[derive(Debug, Clone)]
pub struct ZipEntry {
    /// Path inside the archive. A trailing `/` makes a directory entry.
    pub name: String,
    /// File contents, ignored for directories.
    pub contents: Vec<u8>,
}

impl ZipEntry {
    #[must_use]
    pub fn file(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }

    #[must_use]
    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: Vec::new(),
        }
    }
}

/// Writes a zip archive with the given entries.
///
/// # Errors
///
/// Returns an error if the archive cannot be written.
pub fn write_zip(path: &Path, entries: &[ZipEntry]) -> Result<()> {
    write_zip_with(path, entries, SimpleFileOptions::default())
}

fn write_zip_with(path: &Path, entries: &[ZipEntry], options: SimpleFileOptions) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut zip = ZipWriter::new(file);

    for entry in entries {
        if entry.name.ends_with('/') {
            zip.add_directory(entry.name.as_str(), options)?;
        } else {
            zip.start_file(entry.name.as_str(), options)?;
            zip.write_all(&entry.contents)?;
        }
    }

    zip.finish()?;
    Ok(())
}

/// Writes a zipped model bundle as published: a `<name>/` directory holding
/// a parameter file and a config file.
///
/// # Errors
///
/// Returns an error if the archive cannot be written.
pub fn write_model_bundle(path: &Path, name: &str, params_file: &str) -> Result<()> {
    write_zip(
        path,
        &[
            ZipEntry::dir(format!("{name}/")),
            ZipEntry::file(format!("{name}/{params_file}"), b"weights".to_vec()),
            ZipEntry::file(format!("{name}/config.json"), b"{}".to_vec()),
        ],
    )
}

/// Writes a safetensors file with one 2x2 `f32` tensor `[1, 2, 3, 4]` per name.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_safetensors(path: &Path, names: &[&str]) -> Result<()> {
    let data: Vec<f32> = vec![1.0, 2.0, 3.0, 4.0];
    let data_bytes: &[u8] = bytemuck::cast_slice(&data);

    let mut tensors: HashMap<String, TensorView<'_>> = HashMap::new();
    for name in names {
        let view = TensorView::new(safetensors::Dtype::F32, vec![2, 2], data_bytes)
            .map_err(|e| anyhow::anyhow!("tensor view: {e:?}"))?;
        tensors.insert((*name).to_string(), view);
    }

    let serialized = safetensors::serialize(&tensors, &None)
        .map_err(|e| anyhow::anyhow!("serialize: {e:?}"))?;
    std::fs::write(path, serialized).with_context(|| format!("write {}", path.display()))
}

/// Writes a `PyTorch` zip checkpoint with one 2x2 `f32` tensor `[1, 2, 3, 4]`
/// per name.
///
/// With `wrap_in_state_dict` the tensors sit under a `state_dict` entry next
/// to an `epoch` counter, the way training checkpoints store them. Otherwise
/// the root object is the state dict itself.
///
/// # Errors
///
/// Returns an error if the archive cannot be written.
pub fn write_torch_checkpoint(path: &Path, names: &[&str], wrap_in_state_dict: bool) -> Result<()> {
    let storage: Vec<u8> = [1.0f32, 2.0, 3.0, 4.0]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();

    let mut pickle = Pickle::new();
    if wrap_in_state_dict {
        pickle.op(op::EMPTY_DICT).op(op::MARK).unicode("state_dict");
    }
    pickle.op(op::EMPTY_DICT).op(op::MARK);
    for (i, name) in names.iter().enumerate() {
        pickle.unicode(name).float_tensor_2x2(&i.to_string());
    }
    pickle.op(op::SETITEMS);
    if wrap_in_state_dict {
        pickle.unicode("epoch").int(3).op(op::SETITEMS);
    }

    let mut entries = vec![ZipEntry::file("archive/data.pkl", pickle.finish())];
    entries.extend(
        (0..names.len()).map(|i| ZipEntry::file(format!("archive/data/{i}"), storage.clone())),
    );
    write_zip_with(
        path,
        &entries,
        SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
    )
}

mod op {
    pub const PROTO: u8 = 0x80;
    pub const STOP: u8 = b'.';
    pub const MARK: u8 = b'(';
    pub const TUPLE: u8 = b't';
    pub const EMPTY_DICT: u8 = b'}';
    pub const SETITEMS: u8 = b'u';
    pub const GLOBAL: u8 = b'c';
    pub const BINUNICODE: u8 = b'X';
    pub const BININT1: u8 = b'K';
    pub const BINPERSID: u8 = b'Q';
    pub const REDUCE: u8 = b'R';
    pub const NEWFALSE: u8 = 0x89;
}

/// Pickle byte stream under construction.
struct Pickle(Vec<u8>);

impl Pickle {
    fn new() -> Self {
        Self(vec![op::PROTO, 2])
    }

    fn op(&mut self, code: u8) -> &mut Self {
        self.0.push(code);
        self
    }

    fn int(&mut self, value: u8) -> &mut Self {
        self.0.extend([op::BININT1, value]);
        self
    }

    fn unicode(&mut self, s: &str) -> &mut Self {
        let len = u32::try_from(s.len()).unwrap_or(u32::MAX);
        self.0.push(op::BINUNICODE);
        self.0.extend(len.to_le_bytes());
        self.0.extend(s.as_bytes());
        self
    }

    fn global(&mut self, module: &str, name: &str) -> &mut Self {
        self.0.push(op::GLOBAL);
        self.0.extend(format!("{module}\n{name}\n").as_bytes());
        self
    }

    /// `_rebuild_tensor_v2(storage, 0, (2, 2), (2, 1), False, {})` over the
    /// float storage named `key`.
    fn float_tensor_2x2(&mut self, key: &str) -> &mut Self {
        self.global("torch._utils", "_rebuild_tensor_v2").op(op::MARK);
        self.op(op::MARK)
            .unicode("storage")
            .global("torch", "FloatStorage")
            .unicode(key)
            .unicode("cpu")
            .int(4)
            .op(op::TUPLE)
            .op(op::BINPERSID);
        self.int(0);
        self.op(op::MARK).int(2).int(2).op(op::TUPLE);
        self.op(op::MARK).int(2).int(1).op(op::TUPLE);
        self.op(op::NEWFALSE).op(op::EMPTY_DICT);
        self.op(op::TUPLE).op(op::REDUCE)
    }

    fn finish(mut self) -> Vec<u8> {
        self.0.push(op::STOP);
        self.0
    }
}

/// Lowercase hex SHA-1 of `data`.
#[must_use]
pub fn sha1_hex(data: &[u8]) -> String {
    format!("{:x}", Sha1::digest(data))
}
