// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Assembled image with bin/hex output helpers.

use std::collections::TryReserveError;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Maximum data bytes per Intel HEX record.
const HEX_LINE_LIMIT: usize = 32;

/// A run of image bytes stored at consecutive logical addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub bank: u16,
    pub address: u32,
    /// Index of the first byte in the image.
    pub start: usize,
    pub len: usize,
}

impl Segment {
    fn end_address(&self) -> u64 {
        u64::from(self.address) + self.len as u64
    }
}

/// Image bytes in emission order plus the logical address of each run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImageStore {
    bytes: Vec<u8>,
    segments: Vec<Segment>,
}

impl ImageStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Append `values` at `address` in `bank`.
    pub fn store_slice(
        &mut self,
        bank: u16,
        address: u32,
        values: &[u8],
    ) -> Result<(), TryReserveError> {
        if values.is_empty() {
            return Ok(());
        }
        self.bytes.try_reserve(values.len())?;
        let start = self.bytes.len();
        self.bytes.extend_from_slice(values);

        match self.segments.last_mut() {
            Some(last) if last.bank == bank && last.end_address() == u64::from(address) => {
                last.len += values.len();
            }
            _ => {
                self.segments.try_reserve(1)?;
                self.segments.push(Segment {
                    bank,
                    address,
                    start,
                    len: values.len(),
                });
            }
        }
        Ok(())
    }

    /// Bytes of one segment.
    pub fn segment_bytes(&self, segment: &Segment) -> &[u8] {
        &self.bytes[segment.start..segment.start + segment.len]
    }

    /// Raw image: bytes in emission order, no header and no padding.
    pub fn write_bin_file<W: Write>(&self, mut out: W) -> io::Result<()> {
        out.write_all(&self.bytes)?;
        out.flush()
    }

    /// Write the raw image to `path` through a temporary sibling file.
    ///
    /// The destination is only replaced once the whole image is on disk.
    pub fn write_bin_atomic(&self, path: &Path) -> io::Result<()> {
        let temp = temp_sibling(path);
        let result = File::create(&temp).and_then(|file| {
            let mut writer = BufWriter::new(file);
            self.write_bin_file(&mut writer)?;
            writer.into_inner().map_err(|err| err.into_error())?.sync_all()
        });
        let result = result.and_then(|()| fs::rename(&temp, path));
        if result.is_err() {
            let _ = fs::remove_file(&temp);
        }
        result
    }

    /// Intel HEX output. Addresses above 16 bits use extended linear
    /// address records; banks are not represented.
    pub fn write_hex_file<W: Write>(&self, mut out: W) -> io::Result<()> {
        let mut upper: u16 = 0;
        for segment in &self.segments {
            let data = self.segment_bytes(segment);
            for (index, chunk) in data.chunks(HEX_LINE_LIMIT).enumerate() {
                let mut address = u64::from(segment.address) + (index * HEX_LINE_LIMIT) as u64;
                let mut chunk = chunk;
                while !chunk.is_empty() {
                    let hi = ((address >> 16) & 0xFFFF) as u16;
                    if hi != upper {
                        write_record(&mut out, 0, 0x04, &hi.to_be_bytes())?;
                        upper = hi;
                    }
                    let lo = (address & 0xFFFF) as u16;
                    // A record may not cross a 64K boundary.
                    let room = 0x1_0000 - usize::from(lo);
                    let take = chunk.len().min(room);
                    write_record(&mut out, lo, 0x00, &chunk[..take])?;
                    chunk = &chunk[take..];
                    address += take as u64;
                }
            }
        }
        writeln!(out, ":00000001FF")?;
        out.flush()
    }
}

fn write_record<W: Write>(out: &mut W, address: u16, kind: u8, data: &[u8]) -> io::Result<()> {
    let mut checksum = data.len() as u8;
    checksum = checksum.wrapping_add((address >> 8) as u8);
    checksum = checksum.wrapping_add((address & 0xff) as u8);
    checksum = checksum.wrapping_add(kind);
    let mut hex_data = String::with_capacity(data.len() * 2);
    for &byte in data {
        hex_data.push(hex_digit(byte >> 4));
        hex_data.push(hex_digit(byte & 0x0f));
        checksum = checksum.wrapping_add(byte);
    }
    checksum = (!checksum).wrapping_add(1);
    writeln!(
        out,
        ":{:02X}{:04X}{:02X}{}{:02X}",
        data.len(),
        address,
        kind,
        hex_data,
        checksum
    )
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

fn hex_digit(val: u8) -> char {
    match val {
        0..=9 => (b'0' + val) as char,
        _ => (b'A' + (val - 10)) as char,
    }
}
