use std::collections::BTreeSet;

use crate::engine::{KeyValue, Workload};
use crate::wordcount::words;

/// map: (palabra, documento) una sola vez por palabra distinta del documento.
pub fn map(document: &str, contents: &str) -> Vec<KeyValue> {
    let distinct: BTreeSet<&str> = words(contents).collect();
    distinct
        .into_iter()
        .map(|w| KeyValue::new(w, document))
        .collect()
}

/// reduce: "<cantidad> <doc1>,<doc2>,..." con documentos ordenados y sin repetir.
pub fn reduce(_key: &str, values: &[String]) -> String {
    let docs: BTreeSet<&str> = values.iter().map(String::as_str).collect();
    let joined = docs.iter().copied().collect::<Vec<_>>().join(",");
    format!("{} {}", docs.len(), joined)
}

pub fn workload() -> Workload {
    Workload {
        map_fn: map,
        reduce_fn: reduce,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_emite_cada_palabra_una_vez_por_documento() {
        let kva = map("doc-a.txt", "sol luna sol estrella");
        assert_eq!(
            kva,
            vec![
                KeyValue::new("estrella", "doc-a.txt"),
                KeyValue::new("luna", "doc-a.txt"),
                KeyValue::new("sol", "doc-a.txt"),
            ]
        );
    }

    #[test]
    fn reduce_lista_documentos_ordenados() {
        let values = vec![
            "pg-b.txt".to_string(),
            "pg-a.txt".to_string(),
            "pg-b.txt".to_string(),
        ];
        assert_eq!(reduce("sol", &values), "2 pg-a.txt,pg-b.txt");
    }
}
