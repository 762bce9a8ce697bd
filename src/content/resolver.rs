//! # Resolución de URIs
//! src/content/resolver.rs
//!
//! Convierte la URI del request en un `Target`:
//!
//! - Si la URI contiene `cgi` en **cualquier** parte es dinámica. Es un
//!   match de substring, no de segmento: `/magician.cgi` y
//!   `/docs/cgiguide.txt` también caen acá.
//! - Si no, es estática; una URI terminada en `/` sirve `index.html`.
//!
//! Los paths quedan relativos al directorio base (`"." + uri`), sin
//! normalizar.

/// Recurso al que apunta un request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Archivo que se envía tal cual
    Static { path: String },

    /// Ejecutable CGI; `query` es lo que sigue al `?` (puede ser vacío)
    Dynamic { path: String, query: String },
}

impl Target {
    /// Path relativo al directorio base
    pub fn path(&self) -> &str {
        match self {
            Target::Static { path } | Target::Dynamic { path, .. } => path,
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Target::Static { .. })
    }
}

/// Clasifica y resuelve una URI
///
/// # Ejemplo
/// ```
/// use cgi_httpd::content::{resolve, Target};
///
/// assert_eq!(
///     resolve("/cgi-bin/spin.cgi?5"),
///     Target::Dynamic { path: "./cgi-bin/spin.cgi".to_string(), query: "5".to_string() }
/// );
/// assert_eq!(resolve("/docs/"), Target::Static { path: "./docs/index.html".to_string() });
/// ```
pub fn resolve(uri: &str) -> Target {
    if uri.contains("cgi") {
        let (script, query) = match uri.split_once('?') {
            Some((script, query)) => (script, query),
            None => (uri, ""),
        };
        return Target::Dynamic {
            path: format!(".{}", script),
            query: query.to_string(),
        };
    }

    let mut path = format!(".{}", uri);
    if uri.ends_with('/') {
        path.push_str("index.html");
    }
    Target::Static { path }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_file() {
        assert_eq!(
            resolve("/index.html"),
            Target::Static { path: "./index.html".to_string() }
        );
    }

    #[test]
    fn test_static_directory_gets_index() {
        assert_eq!(resolve("/"), Target::Static { path: "./index.html".to_string() });
        assert_eq!(
            resolve("/a/b/"),
            Target::Static { path: "./a/b/index.html".to_string() }
        );
    }

    #[test]
    fn test_static_keeps_query_in_path() {
        // Solo los dinámicos separan el query string
        assert_eq!(
            resolve("/page.html?x=1"),
            Target::Static { path: "./page.html?x=1".to_string() }
        );
    }

    #[test]
    fn test_dynamic_with_query() {
        let target = resolve("/cgi-bin/spin.cgi?5");
        assert_eq!(target.path(), "./cgi-bin/spin.cgi");
        assert_eq!(
            target,
            Target::Dynamic { path: "./cgi-bin/spin.cgi".to_string(), query: "5".to_string() }
        );
    }

    #[test]
    fn test_dynamic_without_query() {
        assert_eq!(
            resolve("/magician.cgi"),
            Target::Dynamic { path: "./magician.cgi".to_string(), query: String::new() }
        );
    }

    #[test]
    fn test_substring_match_quirk() {
        // "cgi" en medio de un nombre cualquiera también es dinámico
        let target = resolve("/docs/cgiguide.txt");
        assert!(!target.is_static());
        assert_eq!(target.path(), "./docs/cgiguide.txt");
    }

    #[test]
    fn test_dynamic_empty_query_after_mark() {
        assert_eq!(
            resolve("/x.cgi?"),
            Target::Dynamic { path: "./x.cgi".to_string(), query: String::new() }
        );
    }

    #[test]
    fn test_query_keeps_everything_after_first_mark() {
        assert_eq!(
            resolve("/x.cgi?a=1?b=2"),
            Target::Dynamic { path: "./x.cgi".to_string(), query: "a=1?b=2".to_string() }
        );
    }

    #[test]
    fn test_empty_uri() {
        assert_eq!(resolve(""), Target::Static { path: ".".to_string() });
    }
}
