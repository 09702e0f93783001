use serde::{Deserialize, Serialize};
use std::{fs, hash::Hasher, io, path::Path};

/// Par clave/valor emitido por un map. Las claves se pueden repetir.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// map(nombre_archivo, contenido) -> pares intermedios
pub type MapFn = fn(&str, &str) -> Vec<KeyValue>;

/// reduce(clave, valores) -> valor final de esa clave
pub type ReduceFn = fn(&str, &[String]) -> String;

/// Aplicación MapReduce: el par de funciones de usuario.
#[derive(Debug, Clone, Copy)]
pub struct Workload {
    pub map_fn: MapFn,
    pub reduce_fn: ReduceFn,
}

/* =========================
   Particionado
   ========================= */

/// Hash FNV-1a de 64 bits (`fnv`) de los bytes de la clave, recortado a sus
/// 31 bits bajos. Tiene que dar lo mismo en todos los workers: nada de DefaultHasher.
pub fn ihash(key: &str) -> u32 {
    let mut h = fnv::FnvHasher::default();
    h.write(key.as_bytes());
    (h.finish() & 0x7fff_ffff) as u32
}

/// Partición (tarea reduce) a la que va una clave.
pub fn partition_for(key: &str, reduce_count: u32) -> u32 {
    ihash(key) % reduce_count
}

/// Ordena por clave. Estable: valores con la misma clave conservan su orden.
pub fn sort_by_key(records: &mut [KeyValue]) {
    records.sort_by(|a, b| a.key.cmp(&b.key));
}

/// Reparte los pares en `reduce_count` buckets por hash de la clave
/// y deja cada bucket ordenado por clave.
pub fn partition(records: Vec<KeyValue>, reduce_count: u32) -> Vec<Vec<KeyValue>> {
    let mut buckets: Vec<Vec<KeyValue>> = (0..reduce_count).map(|_| Vec::new()).collect();
    if reduce_count == 0 {
        return buckets;
    }

    for kv in records {
        let pid = partition_for(&kv.key, reduce_count) as usize;
        buckets[pid].push(kv);
    }

    for bucket in buckets.iter_mut() {
        sort_by_key(bucket);
    }

    buckets
}

/* =========================
   Agrupado y reduce
   ========================= */

/// Recorre una secuencia YA ordenada y agrupa claves iguales consecutivas.
pub struct KeyGroups<'a> {
    records: &'a [KeyValue],
    pos: usize,
}

impl<'a> Iterator for KeyGroups<'a> {
    type Item = (&'a str, Vec<String>);

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.records.get(self.pos)?;
        let mut end = self.pos + 1;
        while end < self.records.len() && self.records[end].key == first.key {
            end += 1;
        }

        let values = self.records[self.pos..end]
            .iter()
            .map(|kv| kv.value.clone())
            .collect();
        self.pos = end;

        Some((first.key.as_str(), values))
    }
}

pub fn group_sorted(records: &[KeyValue]) -> KeyGroups<'_> {
    KeyGroups { records, pos: 0 }
}

/// Formato de cada línea de salida: "<clave> <valor>".
pub fn format_output_line(key: &str, value: &str) -> String {
    format!("{} {}", key, value)
}

/// Aplica el reduce a cada clave distinta de una secuencia ordenada.
/// Devuelve una línea por clave, en orden ascendente.
pub fn reduce_sorted(records: &[KeyValue], reduce_fn: ReduceFn) -> Vec<String> {
    group_sorted(records)
        .map(|(key, values)| format_output_line(key, &reduce_fn(key, &values)))
        .collect()
}

/* =========================
   Ejecución de tareas
   ========================= */

// Los splits son bytes arbitrarios; lo que no sea UTF-8 válido se reemplaza
fn read_lossy<P: AsRef<Path>>(path: P) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Ejecuta el map de usuario sobre el archivo completo y particiona su salida.
pub fn run_map(
    workload: &Workload,
    input_path: &str,
    reduce_count: u32,
) -> io::Result<Vec<Vec<KeyValue>>> {
    let contents = read_lossy(input_path)?;
    let kva = (workload.map_fn)(input_path, &contents);
    Ok(partition(kva, reduce_count))
}

/// Junta los pares de todas las entradas de una partición, ordena y reduce.
pub fn run_reduce(workload: &Workload, mut intermediate: Vec<KeyValue>) -> Vec<String> {
    sort_by_key(&mut intermediate);
    reduce_sorted(&intermediate, workload.reduce_fn)
}

/// Versión secuencial en un solo proceso (sin particiones): sirve de
/// referencia para comparar contra la salida distribuida.
pub fn run_sequential<P: AsRef<Path>>(workload: &Workload, inputs: &[P]) -> io::Result<Vec<String>> {
    let mut intermediate = Vec::new();

    for input in inputs {
        let name = input.as_ref().to_string_lossy().to_string();
        let contents = read_lossy(input)?;
        intermediate.extend((workload.map_fn)(&name, &contents));
    }

    Ok(run_reduce(workload, intermediate))
}
