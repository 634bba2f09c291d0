//! Reader for legacy `.vtk` files holding `POLYDATA`.
//!
//! Handles `ASCII` and big-endian `BINARY` payloads, the classic cell layout
//! (`POLYGONS n size` followed by `count i0 i1 ...` records) and the
//! `OFFSETS`/`CONNECTIVITY` layout written by VTK 5.1 and later.

use std::path::Path;

use log::debug;

use crate::{converter::MeshDictConverter, mesh_dict::MeshDict};

#[derive(Debug, Clone, Default)]
pub struct LegacyVtkConverter {}

impl LegacyVtkConverter {
    pub fn new() -> Self {
        Self {}
    }
}

impl MeshDictConverter for LegacyVtkConverter {
    type MeshDict = MeshDict;
    type Error = VtkParseError;

    fn vtk_to_mesh_dict(&self, vtk_path: &Path) -> Result<MeshDict, VtkParseError> {
        read_legacy_vtk(vtk_path)
    }
}

#[derive(Debug)]
pub enum VtkParseError {
    IO(std::io::Error),
    UnexpectedEof,
    InvalidHeader(String),
    UnsupportedFormat(String),
    UnsupportedDataset(String),
    UnsupportedDataType(String),
    UnexpectedKeyword(String),
    InvalidNumber(String),
    CountMismatch {
        section: String,
        expected: usize,
        actual: usize,
    },
    IndexOutOfRange {
        index: i64,
        num_points: usize,
    },
}

impl std::fmt::Display for VtkParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VtkParseError::IO(e) => write!(f, "{}", e),
            VtkParseError::UnexpectedEof => write!(f, "unexpected end of file"),
            VtkParseError::InvalidHeader(line) => write!(f, "not a legacy vtk file: {:?}", line),
            VtkParseError::UnsupportedFormat(s) => write!(f, "unsupported file format: {}", s),
            VtkParseError::UnsupportedDataset(s) => write!(f, "unsupported dataset: {}", s),
            VtkParseError::UnsupportedDataType(s) => write!(f, "unsupported data type: {}", s),
            VtkParseError::UnexpectedKeyword(s) => write!(f, "unexpected keyword: {}", s),
            VtkParseError::InvalidNumber(s) => write!(f, "invalid number: {}", s),
            VtkParseError::CountMismatch {
                section,
                expected,
                actual,
            } => write!(
                f,
                "{}: expected {} values, found {}",
                section, expected, actual
            ),
            VtkParseError::IndexOutOfRange { index, num_points } => write!(
                f,
                "point index {} out of range for {} points",
                index, num_points
            ),
        }
    }
}

impl std::error::Error for VtkParseError {}

pub fn read_legacy_vtk<P: AsRef<Path>>(path: P) -> Result<MeshDict, VtkParseError> {
    let data = std::fs::read(path.as_ref()).map_err(VtkParseError::IO)?;
    debug!("parsing {} ({} bytes)", path.as_ref().display(), data.len());
    parse_legacy_vtk(&data)
}

pub fn parse_legacy_vtk(data: &[u8]) -> Result<MeshDict, VtkParseError> {
    let mut reader = VtkReader::new(data);

    let header = reader.read_line().ok_or(VtkParseError::UnexpectedEof)?;
    if !header.starts_with(b"# vtk DataFile Version") {
        return Err(VtkParseError::InvalidHeader(
            String::from_utf8_lossy(header).into_owned(),
        ));
    }
    // title
    reader.read_line().ok_or(VtkParseError::UnexpectedEof)?;

    let format = reader.expect_token()?;
    reader.format = match format.to_ascii_uppercase().as_str() {
        "ASCII" => FileFormat::Ascii,
        "BINARY" => FileFormat::Binary,
        _ => return Err(VtkParseError::UnsupportedFormat(format.to_string())),
    };

    reader.expect_keyword("DATASET")?;
    let dataset = reader.expect_token()?;
    if !dataset.eq_ignore_ascii_case("POLYDATA") {
        return Err(VtkParseError::UnsupportedDataset(dataset.to_string()));
    }

    let mut mesh = MeshDict::default();
    while let Some(keyword) = reader.next_keyword()? {
        match keyword.as_str() {
            "POINTS" => {
                let num_points = reader.expect_usize()?;
                let data_type = DataType::parse(reader.expect_token()?)?;
                let len = checked_len(num_points, 3)?;
                let values = reader.read_values(len, data_type)?;
                mesh.vertices = values
                    .chunks_exact(3)
                    .map(|c| [c[0], c[1], c[2]])
                    .collect();
            }
            "POLYGONS" => {
                mesh.faces = reader
                    .read_cells(&keyword)?
                    .into_iter()
                    .map(to_face)
                    .collect::<Result<Vec<_>, VtkParseError>>()?;
            }
            "VERTICES" | "LINES" | "TRIANGLE_STRIPS" => {
                let cells = reader.read_cells(&keyword)?;
                debug!("skipping {} {} cells", cells.len(), keyword);
            }
            "POINT_DATA" => {
                let num_points = reader.expect_usize()?;
                reader.read_point_data(num_points, &mut mesh)?;
                break;
            }
            "CELL_DATA" => break,
            "METADATA" => reader.skip_metadata(),
            other => return Err(VtkParseError::UnexpectedKeyword(other.to_string())),
        }
    }

    let num_points = mesh.vertices.len();
    for &index in mesh.faces.iter().flatten() {
        if index as usize >= num_points {
            return Err(VtkParseError::IndexOutOfRange {
                index: index as i64,
                num_points,
            });
        }
    }

    Ok(mesh)
}

fn to_face(cell: Vec<i64>) -> Result<Vec<u32>, VtkParseError> {
    cell.into_iter()
        .map(|i| u32::try_from(i).map_err(|_| VtkParseError::InvalidNumber(i.to_string())))
        .collect()
}

fn checked_len(count: usize, components: usize) -> Result<usize, VtkParseError> {
    count
        .checked_mul(components)
        .ok_or_else(|| VtkParseError::InvalidNumber(count.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Ascii,
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl DataType {
    fn parse(s: &str) -> Result<Self, VtkParseError> {
        let data_type = match s.to_ascii_lowercase().as_str() {
            "unsigned_char" => DataType::U8,
            "char" => DataType::I8,
            "unsigned_short" => DataType::U16,
            "short" => DataType::I16,
            "unsigned_int" | "vtktypeuint32" => DataType::U32,
            "int" | "vtktypeint32" => DataType::I32,
            "unsigned_long" | "vtktypeuint64" => DataType::U64,
            "long" | "vtktypeint64" | "vtkidtype" => DataType::I64,
            "float" => DataType::F32,
            "double" => DataType::F64,
            _ => return Err(VtkParseError::UnsupportedDataType(s.to_string())),
        };
        Ok(data_type)
    }

    fn size(self) -> usize {
        match self {
            DataType::U8 | DataType::I8 => 1,
            DataType::U16 | DataType::I16 => 2,
            DataType::U32 | DataType::I32 | DataType::F32 => 4,
            DataType::U64 | DataType::I64 | DataType::F64 => 8,
        }
    }

    fn is_float(self) -> bool {
        matches!(self, DataType::F32 | DataType::F64)
    }

    fn decode_f64(self, b: &[u8]) -> f64 {
        match self {
            DataType::F32 => f32::from_be_bytes(be(b)) as f64,
            DataType::F64 => f64::from_be_bytes(be(b)),
            DataType::U64 => u64::from_be_bytes(be(b)) as f64,
            _ => self.decode_i64(b) as f64,
        }
    }

    // Callers reject float types; U64 above i64::MAX wraps.
    fn decode_i64(self, b: &[u8]) -> i64 {
        match self {
            DataType::U8 => b[0] as i64,
            DataType::I8 => b[0] as i8 as i64,
            DataType::U16 => u16::from_be_bytes(be(b)) as i64,
            DataType::I16 => i16::from_be_bytes(be(b)) as i64,
            DataType::U32 => u32::from_be_bytes(be(b)) as i64,
            DataType::I32 => i32::from_be_bytes(be(b)) as i64,
            DataType::U64 => u64::from_be_bytes(be(b)) as i64,
            DataType::I64 => i64::from_be_bytes(be(b)),
            DataType::F32 | DataType::F64 => 0,
        }
    }
}

fn be<const N: usize>(b: &[u8]) -> [u8; N] {
    let mut buf = [0u8; N];
    buf.copy_from_slice(&b[..N]);
    buf
}

struct VtkReader<'a> {
    data: &'a [u8],
    pos: usize,
    format: FileFormat,
}

impl<'a> VtkReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            format: FileFormat::Ascii,
        }
    }

    fn read_line(&mut self) -> Option<&'a [u8]> {
        if self.pos >= self.data.len() {
            return None;
        }
        let rest = &self.data[self.pos..];
        let end = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
        self.pos += (end + 1).min(rest.len());
        let line = &rest[..end];
        match line.last() {
            Some(b'\r') => Some(&line[..end - 1]),
            _ => Some(line),
        }
    }

    fn skip_rest_of_line(&mut self) {
        while self.pos < self.data.len() && self.data[self.pos] != b'\n' {
            self.pos += 1;
        }
        if self.pos < self.data.len() {
            self.pos += 1;
        }
    }

    fn next_token(&mut self) -> Option<&'a [u8]> {
        while self.pos < self.data.len() && self.data[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if self.pos >= self.data.len() {
            return None;
        }
        let start = self.pos;
        while self.pos < self.data.len() && !self.data[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        Some(&self.data[start..self.pos])
    }

    fn peek_token(&mut self) -> Option<&'a [u8]> {
        let pos = self.pos;
        let token = self.next_token();
        self.pos = pos;
        token
    }

    fn expect_token(&mut self) -> Result<&'a str, VtkParseError> {
        let token = self.next_token().ok_or(VtkParseError::UnexpectedEof)?;
        std::str::from_utf8(token).map_err(|_| {
            VtkParseError::UnexpectedKeyword(String::from_utf8_lossy(token).into_owned())
        })
    }

    fn next_keyword(&mut self) -> Result<Option<String>, VtkParseError> {
        match self.next_token() {
            Some(token) => match std::str::from_utf8(token) {
                Ok(s) => Ok(Some(s.to_ascii_uppercase())),
                Err(_) => Err(VtkParseError::UnexpectedKeyword(
                    String::from_utf8_lossy(token).into_owned(),
                )),
            },
            None => Ok(None),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), VtkParseError> {
        let token = self.expect_token()?;
        if !token.eq_ignore_ascii_case(keyword) {
            return Err(VtkParseError::UnexpectedKeyword(token.to_string()));
        }
        Ok(())
    }

    fn expect_usize(&mut self) -> Result<usize, VtkParseError> {
        let token = self.expect_token()?;
        token
            .parse()
            .map_err(|_| VtkParseError::InvalidNumber(token.to_string()))
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], VtkParseError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(VtkParseError::UnexpectedEof)?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn take_binary(
        &mut self,
        count: usize,
        data_type: DataType,
    ) -> Result<&'a [u8], VtkParseError> {
        // binary data starts on the line after its keyword
        self.skip_rest_of_line();
        let len = checked_len(count, data_type.size())?;
        self.take(len)
    }

    /// Reads `count` finite values. NaN and infinities are rejected since they
    /// have no JSON representation.
    fn read_values(
        &mut self,
        count: usize,
        data_type: DataType,
    ) -> Result<Vec<f64>, VtkParseError> {
        let values: Vec<f64> = match self.format {
            FileFormat::Ascii => (0..count)
                .map(|_| {
                    let token = self.expect_token()?;
                    token
                        .parse::<f64>()
                        .map_err(|_| VtkParseError::InvalidNumber(token.to_string()))
                })
                .collect::<Result<_, _>>()?,
            FileFormat::Binary => {
                let bytes = self.take_binary(count, data_type)?;
                bytes
                    .chunks_exact(data_type.size())
                    .map(|b| data_type.decode_f64(b))
                    .collect()
            }
        };
        if let Some(v) = values.iter().find(|v| !v.is_finite()) {
            return Err(VtkParseError::InvalidNumber(v.to_string()));
        }
        Ok(values)
    }

    fn read_integers(
        &mut self,
        count: usize,
        data_type: DataType,
    ) -> Result<Vec<i64>, VtkParseError> {
        if data_type.is_float() {
            return Err(VtkParseError::UnsupportedDataType(format!(
                "{:?} for cell data",
                data_type
            )));
        }
        match self.format {
            FileFormat::Ascii => (0..count)
                .map(|_| {
                    let token = self.expect_token()?;
                    token
                        .parse::<i64>()
                        .map_err(|_| VtkParseError::InvalidNumber(token.to_string()))
                })
                .collect(),
            FileFormat::Binary => {
                let bytes = self.take_binary(count, data_type)?;
                Ok(bytes
                    .chunks_exact(data_type.size())
                    .map(|b| data_type.decode_i64(b))
                    .collect())
            }
        }
    }

    fn read_cells(&mut self, section: &str) -> Result<Vec<Vec<i64>>, VtkParseError> {
        let count = self.expect_usize()?;
        let size = self.expect_usize()?;

        if matches!(self.peek_token(), Some(t) if t.eq_ignore_ascii_case(b"OFFSETS")) {
            self.next_token();
            let data_type = DataType::parse(self.expect_token()?)?;
            let offsets = self.read_integers(count, data_type)?;
            self.expect_keyword("CONNECTIVITY")?;
            let data_type = DataType::parse(self.expect_token()?)?;
            let connectivity = self.read_integers(size, data_type)?;
            return cells_from_offsets(section, &offsets, &connectivity);
        }

        let values = self.read_integers(size, DataType::I32)?;
        // `count` is unchecked until the records are walked
        let mut cells = Vec::new();
        let mut rest = values.as_slice();
        for _ in 0..count {
            let (&n, tail) = rest
                .split_first()
                .ok_or_else(|| mismatch(section, size, size + 1))?;
            let n =
                usize::try_from(n).map_err(|_| VtkParseError::InvalidNumber(n.to_string()))?;
            if n > tail.len() {
                return Err(mismatch(section, size, size - tail.len() + n));
            }
            let (cell, tail) = tail.split_at(n);
            cells.push(cell.to_vec());
            rest = tail;
        }
        if !rest.is_empty() {
            return Err(mismatch(section, size, size - rest.len()));
        }
        Ok(cells)
    }

    fn read_point_data(
        &mut self,
        num_points: usize,
        mesh: &mut MeshDict,
    ) -> Result<(), VtkParseError> {
        loop {
            match self.peek_token() {
                Some(t) if t.eq_ignore_ascii_case(b"SCALARS") => {
                    self.next_token();
                    let name = self.expect_token()?.to_string();
                    let data_type = DataType::parse(self.expect_token()?)?;
                    let mut num_components = 1;
                    if let Some(n) = self
                        .peek_token()
                        .and_then(|t| std::str::from_utf8(t).ok())
                        .and_then(|t| t.parse::<usize>().ok())
                    {
                        self.next_token();
                        num_components = n;
                    }
                    if matches!(self.peek_token(), Some(t) if t.eq_ignore_ascii_case(b"LOOKUP_TABLE"))
                    {
                        self.next_token();
                        self.expect_token()?;
                    }
                    let len = checked_len(num_points, num_components)?;
                    let values = self.read_values(len, data_type)?;
                    mesh.scalars.insert(name, values);
                }
                Some(t) if t.eq_ignore_ascii_case(b"METADATA") => {
                    self.next_token();
                    self.skip_metadata();
                }
                Some(t) => {
                    debug!(
                        "stopping at point data section {}",
                        String::from_utf8_lossy(t)
                    );
                    return Ok(());
                }
                None => return Ok(()),
            }
        }
    }

    // METADATA blocks run until the next blank line.
    fn skip_metadata(&mut self) {
        self.skip_rest_of_line();
        while let Some(line) = self.read_line() {
            if line.iter().all(|b| b.is_ascii_whitespace()) {
                break;
            }
        }
    }
}

fn mismatch(section: &str, expected: usize, actual: usize) -> VtkParseError {
    VtkParseError::CountMismatch {
        section: section.to_string(),
        expected,
        actual,
    }
}

fn cells_from_offsets(
    section: &str,
    offsets: &[i64],
    connectivity: &[i64],
) -> Result<Vec<Vec<i64>>, VtkParseError> {
    if offsets.first().is_some_and(|&first| first != 0) {
        return Err(VtkParseError::InvalidNumber(offsets[0].to_string()));
    }
    let last = offsets.last().copied().unwrap_or(0);
    if last != connectivity.len() as i64 {
        return Err(mismatch(
            section,
            connectivity.len(),
            usize::try_from(last).unwrap_or(0),
        ));
    }
    // offsets must be non-decreasing and stay within the connectivity array
    let mut cells = Vec::new();
    let mut start = 0;
    for &offset in offsets.iter().skip(1) {
        let end = usize::try_from(offset)
            .ok()
            .filter(|&end| start <= end && end <= connectivity.len())
            .ok_or_else(|| VtkParseError::InvalidNumber(offset.to_string()))?;
        cells.push(connectivity[start..end].to_vec());
        start = end;
    }
    Ok(cells)
}
