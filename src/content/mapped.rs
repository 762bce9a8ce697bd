//! # Archivo mapeado en memoria
//! src/content/mapped.rs
//!
//! Mapeo de solo lectura de un archivo completo. El `munmap` ocurre en el
//! `Drop`, así que el mapeo se libera en cualquier camino de salida.

use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::ptr::NonNull;
use std::slice;

/// Región `PROT_READ`/`MAP_PRIVATE` con el contenido del archivo
pub struct MappedFile {
    /// `None` para archivos vacíos (mmap de largo 0 es inválido)
    ptr: Option<NonNull<u8>>,
    len: usize,
}

impl MappedFile {
    /// Abre y mapea `path` entero. `len` es el tamaño obtenido del `stat`.
    ///
    /// El descriptor se cierra al volver; el mapeo sigue siendo válido.
    pub fn open(path: &Path, len: usize) -> io::Result<Self> {
        if len == 0 {
            return Ok(Self { ptr: None, len: 0 });
        }

        let file = File::open(path)?;

        let addr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                len,
                libc::PROT_READ,
                libc::MAP_PRIVATE,
                file.as_raw_fd(),
                0,
            )
        };

        if addr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }

        Ok(Self {
            ptr: NonNull::new(addr as *mut u8),
            len,
        })
    }

    pub fn as_slice(&self) -> &[u8] {
        match self.ptr {
            // El mapeo vive hasta el drop y nadie lo escribe
            Some(ptr) => unsafe { slice::from_raw_parts(ptr.as_ptr(), self.len) },
            None => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Drop for MappedFile {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr {
            let ret = unsafe { libc::munmap(ptr.as_ptr() as *mut libc::c_void, self.len) };
            if ret != 0 {
                log::warn!("munmap failed: {}", io::Error::last_os_error());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_file(name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("cgi_httpd-mapped-{}-{}", std::process::id(), name));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_map_contents() {
        let data: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let path = scratch_file("bytes", &data);

        let mapped = MappedFile::open(&path, data.len()).unwrap();
        assert_eq!(mapped.len(), data.len());
        assert_eq!(mapped.as_slice(), &data[..]);

        drop(mapped);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_empty_file() {
        let path = scratch_file("empty", b"");

        let mapped = MappedFile::open(&path, 0).unwrap();
        assert!(mapped.is_empty());
        assert!(mapped.as_slice().is_empty());

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("cgi_httpd-mapped-does-not-exist");
        assert!(MappedFile::open(&path, 10).is_err());
    }
}
