use serde::{Deserialize, Serialize};

/// Fase global del job. Sólo avanza: Mapping -> Reducing -> Done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobPhase {
    Mapping,
    Reducing,
    Done,
}

impl JobPhase {
    pub fn is_done(self) -> bool {
        matches!(self, JobPhase::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn las_fases_estan_ordenadas() {
        assert!(JobPhase::Mapping < JobPhase::Reducing);
        assert!(JobPhase::Reducing < JobPhase::Done);
        assert!(JobPhase::Done.is_done());
        assert!(!JobPhase::Reducing.is_done());
    }

    #[test]
    fn se_serializa_en_mayusculas() {
        let s = serde_json::to_string(&JobPhase::Reducing).unwrap();
        assert_eq!(s, "\"REDUCING\"");
    }
}
