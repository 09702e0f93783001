//! Archivos intermedios y de salida, con commit en dos pasos:
//! se escribe a un temporal único y sólo se renombra al nombre final
//! cuando el master acepta el reporte.

use std::{
    fs::{self, File},
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use tempfile::TempPath;
use tracing::debug;

use crate::engine::KeyValue;

pub const TEMP_PREFIX: &str = "mr-tmp-";
pub const OUTPUT_PREFIX: &str = "mr-out-";

/// mr-{map}-{reduce}
pub fn intermediate_name(map_index: u32, reduce_index: u32) -> String {
    format!("mr-{}-{}", map_index, reduce_index)
}

/// mr-out-{reduce}
pub fn output_name(reduce_index: u32) -> String {
    format!("{}{}", OUTPUT_PREFIX, reduce_index)
}

pub fn intermediate_path(dir: &Path, map_index: u32, reduce_index: u32) -> PathBuf {
    dir.join(intermediate_name(map_index, reduce_index))
}

pub fn output_path(dir: &Path, reduce_index: u32) -> PathBuf {
    dir.join(output_name(reduce_index))
}

/// Archivo temporal ya escrito, junto al nombre final que tendría.
/// Si se descarta sin commit, el temporal se borra al hacer drop.
#[derive(Debug)]
pub struct StagedFile {
    temp: TempPath,
    target: PathBuf,
}

impl StagedFile {
    pub fn temp_path(&self) -> &Path {
        &self.temp
    }

    pub fn target(&self) -> &Path {
        &self.target
    }
}

/// Conjunto de archivos de una tarea pendientes de autorización.
#[derive(Debug, Default)]
pub struct PendingCommit {
    files: Vec<StagedFile>,
}

impl PendingCommit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file: StagedFile) {
        self.files.push(file);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Nombres finales, en el orden en que se agregaron (para el Collect).
    pub fn target_names(&self) -> Vec<String> {
        self.files
            .iter()
            .map(|f| f.target.to_string_lossy().to_string())
            .collect()
    }

    /// Renombra cada temporal a su nombre final. Sólo tras un Collect aceptado.
    pub fn commit(self) -> io::Result<Vec<PathBuf>> {
        let mut done = Vec::with_capacity(self.files.len());
        for StagedFile { temp, target } in self.files {
            debug!("renombrando {} -> {}", temp.display(), target.display());
            temp.persist(&target)?;
            done.push(target);
        }
        Ok(done)
    }

    /// Tira los temporales sin tocar ningún nombre final.
    pub fn discard(self) {
        for f in &self.files {
            debug!("descartando {}", f.temp.display());
        }
        drop(self.files);
    }
}

fn create_temp(dir: &Path) -> io::Result<tempfile::NamedTempFile> {
    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(dir)?;
    }
    // en el mismo directorio que el destino para que el rename sea atómico
    tempfile::Builder::new().prefix(TEMP_PREFIX).tempfile_in(dir)
}

/// Escribe un bucket intermedio (JSONL, un KeyValue por línea) a un temporal.
pub fn stage_intermediate(dir: &Path, target: PathBuf, records: &[KeyValue]) -> io::Result<StagedFile> {
    let mut tmp = create_temp(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        for kv in records {
            serde_json::to_writer(&mut writer, kv)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;

    Ok(StagedFile {
        temp: tmp.into_temp_path(),
        target,
    })
}

/// Escribe líneas de salida ya formateadas ("clave valor") a un temporal.
pub fn stage_output(dir: &Path, target: PathBuf, lines: &[String]) -> io::Result<StagedFile> {
    let mut tmp = create_temp(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        for line in lines {
            writeln!(writer, "{}", line)?;
        }
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;

    Ok(StagedFile {
        temp: tmp.into_temp_path(),
        target,
    })
}

/// Lee un archivo intermedio (JSONL) completo.
pub fn read_intermediate(path: &Path) -> io::Result<Vec<KeyValue>> {
    let reader = BufReader::new(File::open(path)?);

    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        out.push(serde_json::from_str(&line)?);
    }

    Ok(out)
}

/// Archivos mr-out-N de un directorio, ordenados por N. Ignora temporales.
pub fn list_outputs(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut found: Vec<(u32, PathBuf)> = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(idx) = name
            .strip_prefix(OUTPUT_PREFIX)
            .and_then(|n| n.parse::<u32>().ok())
        {
            found.push((idx, entry.path()));
        }
    }

    found.sort_by_key(|(idx, _)| *idx);
    Ok(found.into_iter().map(|(_, p)| p).collect())
}

/// Todas las líneas de todos los mr-out-* de un directorio, ordenadas.
pub fn read_outputs(dir: &Path) -> io::Result<Vec<String>> {
    let mut lines = Vec::new();
    for path in list_outputs(dir)? {
        for line in BufReader::new(File::open(&path)?).lines() {
            let line = line?;
            if !line.is_empty() {
                lines.push(line);
            }
        }
    }
    lines.sort();
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_files(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|n| n.starts_with(TEMP_PREFIX))
            .collect()
    }

    #[test]
    fn nombres_siguen_la_convencion() {
        assert_eq!(intermediate_name(3, 7), "mr-3-7");
        assert_eq!(output_name(2), "mr-out-2");
        assert_eq!(
            intermediate_path(Path::new("/data"), 0, 1),
            PathBuf::from("/data/mr-0-1")
        );
    }

    #[test]
    fn commit_renombra_al_nombre_final() {
        let dir = tempfile::tempdir().unwrap();
        let recs = vec![KeyValue::new("a", "1"), KeyValue::new("b", "2")];

        let staged = stage_intermediate(dir.path(), intermediate_path(dir.path(), 0, 0), &recs).unwrap();
        assert!(staged.temp_path().exists());
        assert!(!staged.target().exists());

        let mut pending = PendingCommit::new();
        pending.push(staged);
        let committed = pending.commit().unwrap();

        assert_eq!(committed, vec![dir.path().join("mr-0-0")]);
        assert_eq!(read_intermediate(&committed[0]).unwrap(), recs);
        assert!(temp_files(dir.path()).is_empty());
    }

    #[test]
    fn discard_no_deja_ni_temporales_ni_finales() {
        let dir = tempfile::tempdir().unwrap();
        let mut pending = PendingCommit::new();
        for r in 0..3 {
            let target = intermediate_path(dir.path(), 1, r);
            pending.push(stage_intermediate(dir.path(), target, &[KeyValue::new("k", "v")]).unwrap());
        }
        assert_eq!(temp_files(dir.path()).len(), 3);

        pending.discard();

        assert!(temp_files(dir.path()).is_empty());
        assert!(!dir.path().join("mr-1-0").exists());
    }

    #[test]
    fn dos_intentos_de_la_misma_tarea_usan_temporales_distintos() {
        let dir = tempfile::tempdir().unwrap();
        let target = output_path(dir.path(), 0);
        let a = stage_output(dir.path(), target.clone(), &["x 1".to_string()]).unwrap();
        let b = stage_output(dir.path(), target, &["x 2".to_string()]).unwrap();
        assert_ne!(a.temp_path(), b.temp_path());
    }

    #[test]
    fn target_names_respeta_el_orden_de_los_buckets() {
        let dir = tempfile::tempdir().unwrap();
        let mut pending = PendingCommit::new();
        for r in 0..2 {
            pending.push(stage_intermediate(dir.path(), intermediate_path(dir.path(), 4, r), &[]).unwrap());
        }
        let names = pending.target_names();
        assert!(names[0].ends_with("mr-4-0"));
        assert!(names[1].ends_with("mr-4-1"));
    }

    #[test]
    fn list_outputs_ignora_otros_archivos_y_ordena_por_indice() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mr-out-10"), "b 1\n").unwrap();
        fs::write(dir.path().join("mr-out-2"), "a 1\n").unwrap();
        fs::write(dir.path().join("mr-0-2"), "{}\n").unwrap();
        fs::write(dir.path().join("mr-out-x"), "").unwrap();

        let outs = list_outputs(dir.path()).unwrap();
        assert_eq!(
            outs,
            vec![dir.path().join("mr-out-2"), dir.path().join("mr-out-10")]
        );

        assert_eq!(read_outputs(dir.path()).unwrap(), vec!["a 1", "b 1"]);
    }

    #[test]
    fn read_intermediate_con_archivo_inexistente_da_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_intermediate(&dir.path().join("mr-9-9")).is_err());
    }
}
