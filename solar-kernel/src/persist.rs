/**
 * PERSISTANCE - Sauvegarde YAML des compteurs de marche
 *
 * RÔLE : Lire au démarrage / écrire périodiquement le `PersistedRecord`
 * (Timestamp, Runtime, BrinePumpRuntime, SolarPumpRuntime).
 *
 * FONCTIONNEMENT :
 * - Fichier absent (ou vide) au premier démarrage : enregistrement à zéro, pas d'erreur
 * - Écriture dans un fichier temporaire voisin (nom unique par écriture) puis rename :
 *   jamais de fichier tronqué, deux écritures simultanées ne se marchent pas dessus
 * - Mode 0600 sur Unix
 */

use crate::models::PersistedRecord;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("can't read data file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("can't write data file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("invalid data file {path}: {source}")]
    Decode { path: PathBuf, source: serde_yaml::Error },
    #[error("can't encode record: {0}")]
    Encode(#[from] serde_yaml::Error),
}

/// Charge l'enregistrement. Seul le cas « fichier absent » est toléré.
pub async fn load_record(path: &Path) -> Result<PersistedRecord, PersistError> {
    let txt = match fs::read_to_string(path).await {
        Ok(txt) => txt,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("no data file at {}, starting from zero", path.display());
            let record = PersistedRecord::default();
            if let Err(e) = save_record(path, &record).await {
                warn!("can't create initial data file: {e}");
            }
            return Ok(record);
        }
        Err(source) => return Err(PersistError::Read { path: path.to_path_buf(), source }),
    };

    if txt.trim().is_empty() {
        return Ok(PersistedRecord::default());
    }

    serde_yaml::from_str(&txt).map_err(|source| PersistError::Decode { path: path.to_path_buf(), source })
}

pub async fn save_record(path: &Path, record: &PersistedRecord) -> Result<(), PersistError> {
    let data = serde_yaml::to_string(record)?;
    let write_err = |source: io::Error| PersistError::Write { path: path.to_path_buf(), source };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp = tmp_path(path);
    if let Err(e) = write_private(&tmp, data, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }
    debug!("saved runtimes to {}", path.display());
    Ok(())
}

async fn write_private(tmp: &Path, data: String, path: &Path) -> Result<(), PersistError> {
    let write_err = |source: io::Error| PersistError::Write { path: path.to_path_buf(), source };
    fs::write(tmp, data).await.map_err(write_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp, std::fs::Permissions::from_mode(0o600)).await.map_err(write_err)?;
    }

    fs::rename(tmp, path).await.map_err(write_err)
}

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

// solar.yaml -> solar.yaml.<pid>.<n>.tmp
fn tmp_path(path: &Path) -> PathBuf {
    let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".{}.{}.tmp", std::process::id(), seq));
    path.with_file_name(name)
}
