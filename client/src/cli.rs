use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use common::{engine, store, workload_by_name};
use reqwest::Client;
use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "Herramientas locales para correr y verificar jobs MapReduce")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Corre el job completo en un solo proceso (salida de referencia)
    Sequential {
        /// wc | indexer
        #[arg(value_name = "APP")]
        app: String,

        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        #[arg(long, default_value = "mr-out-0")]
        output: PathBuf,
    },

    /// Compara los mr-out-* de un directorio contra una salida de referencia
    Verify {
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        #[arg(value_name = "ESPERADO")]
        expected: PathBuf,
    },

    /// Consulta si el master está vivo
    Health {
        /// En Docker: MASTER_URL=http://master:8080
        #[arg(long, env = "MASTER_URL", default_value = "http://localhost:8080")]
        master_url: String,
    },
}

fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("no se pudo crear {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    out.flush()?;
    Ok(())
}

fn sorted_lines(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("no se pudo leer {}", path.display()))?;
    let mut lines: Vec<String> = contents
        .lines()
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    lines.sort();
    Ok(lines)
}

/// Diferencias entre lo producido y lo esperado (ambos ordenados).
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Mismatch {
    pub missing: Vec<String>,
    pub unexpected: Vec<String>,
}

impl Mismatch {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

pub fn compare(got: &[String], expected: &[String]) -> Mismatch {
    let mut mismatch = Mismatch::default();
    let (mut i, mut j) = (0, 0);

    // merge de dos listas ordenadas
    while i < got.len() && j < expected.len() {
        match got[i].cmp(&expected[j]) {
            std::cmp::Ordering::Equal => {
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => {
                mismatch.unexpected.push(got[i].clone());
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                mismatch.missing.push(expected[j].clone());
                j += 1;
            }
        }
    }
    mismatch.unexpected.extend_from_slice(&got[i..]);
    mismatch.missing.extend_from_slice(&expected[j..]);
    mismatch
}

pub fn verify(dir: &Path, expected: &Path) -> Result<Mismatch> {
    let got = store::read_outputs(dir)
        .with_context(|| format!("no se pudo leer la salida en {}", dir.display()))?;
    let expected = sorted_lines(expected)?;
    Ok(compare(&got, &expected))
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sequential { app, inputs, output } => {
            let workload = workload_by_name(&app)?;
            let lines = engine::run_sequential(&workload, &inputs)?;
            write_lines(&output, &lines)?;

            println!("Job secuencial completado:");
            println!("  app     : {}", app);
            println!("  entradas: {}", inputs.len());
            println!("  claves  : {}", lines.len());
            println!("  salida  : {}", output.display());
        }

        Commands::Verify { dir, expected } => {
            let mismatch = verify(&dir, &expected)?;
            if mismatch.is_empty() {
                println!("OK: {} coincide con {}", dir.display(), expected.display());
            } else {
                for line in mismatch.missing.iter().take(10) {
                    println!("  falta    : {}", line);
                }
                for line in mismatch.unexpected.iter().take(10) {
                    println!("  sobra    : {}", line);
                }
                bail!(
                    "la salida no coincide: {} líneas faltantes, {} sobrantes",
                    mismatch.missing.len(),
                    mismatch.unexpected.len()
                );
            }
        }

        Commands::Health { master_url } => {
            let url = format!("{}/health", master_url.trim_end_matches('/'));
            let resp = Client::new().get(&url).send().await?;
            if resp.status().is_success() {
                println!("master vivo en {}: {}", master_url, resp.text().await?);
            } else {
                bail!("el master respondió con status {}", resp.status());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn compare_detecta_faltantes_y_sobrantes() {
        let m = compare(&s(&["a 1", "b 2", "d 1"]), &s(&["a 1", "c 1", "d 1", "e 5"]));
        assert_eq!(m.missing, s(&["c 1", "e 5"]));
        assert_eq!(m.unexpected, s(&["b 2"]));
        assert!(!m.is_empty());
    }

    #[test]
    fn verify_acepta_salida_repartida_en_varios_archivos() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mr-out-0"), "b 1\nd 2\n").unwrap();
        fs::write(dir.path().join("mr-out-1"), "a 3\nc 1\n").unwrap();
        // los temporales no cuentan
        fs::write(dir.path().join("mr-tmp-xyz"), "z 9\n").unwrap();

        let expected = dir.path().join("esperado.txt");
        write_lines(&expected, &s(&["a 3", "b 1", "c 1", "d 2"])).unwrap();

        assert!(verify(dir.path(), &expected).unwrap().is_empty());
    }

    #[test]
    fn sequential_y_verify_cierran_el_circulo() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("pg-0.txt");
        fs::write(&input, "uno dos dos tres tres tres").unwrap();

        let workload = workload_by_name("wc").unwrap();
        let lines = engine::run_sequential(&workload, &[&input]).unwrap();
        write_lines(&dir.path().join("mr-out-0"), &lines).unwrap();

        let expected = dir.path().join("esperado.txt");
        write_lines(&expected, &s(&["dos 2", "tres 3", "uno 1"])).unwrap();
        assert!(verify(dir.path(), &expected).unwrap().is_empty());
    }
}
