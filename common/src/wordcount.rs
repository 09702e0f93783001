use crate::engine::{KeyValue, Workload};

/// Separa el contenido en palabras: cualquier carácter que no sea letra corta.
pub fn words(contents: &str) -> impl Iterator<Item = &str> {
    contents
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
}

/// map: emite (palabra, "1") por cada aparición.
pub fn map(_filename: &str, contents: &str) -> Vec<KeyValue> {
    words(contents).map(|w| KeyValue::new(w, "1")).collect()
}

/// reduce: cuántas veces apareció la palabra.
pub fn reduce(_key: &str, values: &[String]) -> String {
    values.len().to_string()
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
    fn map_separa_por_no_letras() {
        let kva = map("in.txt", "Hola, hola mundo!! 42 mundo_prueba");
        let keys: Vec<&str> = kva.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(keys, vec!["Hola", "hola", "mundo", "mundo", "prueba"]);
        assert!(kva.iter().all(|kv| kv.value == "1"));
    }

    #[test]
    fn map_de_archivo_vacio_no_emite_nada() {
        assert!(map("vacio.txt", "").is_empty());
        assert!(map("vacio.txt", " \n\t 123 ").is_empty());
    }

    #[test]
    fn reduce_cuenta_valores() {
        let values = vec!["1".to_string(); 3];
        assert_eq!(reduce("x", &values), "3");
    }
}
