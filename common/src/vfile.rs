use std::{
    io::{self, BufReader, Cursor, Read},
    path::Path,
};

/// A named in-memory file, read by the open path and written by the save path.
#[derive(Default, Clone, Debug)]
pub struct VFile {
    pub name: String,
    pub data: Vec<u8>,
}

impl VFile {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// An empty file to save into.
    pub fn create(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn reader(&self) -> BufReader<Cursor<&[u8]>> {
        BufReader::new(Cursor::new(&self.data[..]))
    }

    /// Up to `len` leading bytes, for format sniffing.
    pub fn prefix(&self, len: usize) -> io::Result<Vec<u8>> {
        let mut prefix = Vec::with_capacity(len);
        self.reader().take(len as u64).read_to_end(&mut prefix)?;
        Ok(prefix)
    }

    /// Lower-case extension with its leading dot, e.g. `.vtf`.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
    }
}

impl io::Write for VFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn extension_is_normalised() {
        assert_eq!(VFile::create("a/B.VTF").extension().as_deref(), Some(".vtf"));
        assert_eq!(VFile::create("noext").extension(), None);
    }

    #[test]
    fn write_then_read() {
        let mut file = VFile::create("out.bin");
        file.write_all(b"VTF\0rest").unwrap();
        assert_eq!(file.prefix(4).unwrap(), b"VTF\0");
        assert_eq!(file.prefix(64).unwrap().len(), 8);

        let mut all = String::new();
        file.reader().read_to_string(&mut all).unwrap();
        assert_eq!(all, "VTF\0rest");
    }
}
