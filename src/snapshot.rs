//! Version-stamped snapshot persistence.
//!
//! A snapshot is a bincode payload framed as
//! `[payload][magic "NSW1"][CRC32 BE]`. The payload carries a version
//! number, the configuration, and the node arena (values with their edge
//! lists); value serialization is delegated to the caller through serde
//! bounds that only these functions require. Scratch state is not
//! persisted — it is rebuilt lazily on first use. Loading verifies the
//! checksum, the version, the configuration ranges, and the structural
//! invariants of the graph before handing the set back.

use crate::distance::Distance;
use crate::nsw::graph::{NearSet, Node, NswConfig};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use std::io::{self, Read, Write};

/// Magic bytes between the payload and the CRC32 footer.
pub const SNAPSHOT_MAGIC: &[u8; 4] = b"NSW1";

/// Current snapshot payload version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
#[serde(bound = "V: Serialize + Eq + Hash")]
struct SnapshotRef<'a, V> {
    version: u32,
    config: &'a NswConfig,
    nodes: &'a IndexMap<V, Node>,
}

#[derive(Deserialize)]
#[serde(bound = "V: DeserializeOwned + Eq + Hash")]
struct Snapshot<V> {
    version: u32,
    config: NswConfig,
    nodes: IndexMap<V, Node>,
}

impl<V: Eq + Hash, D: Distance<V>> NearSet<V, D> {
    /// Writes a version-stamped snapshot of the set to `writer`.
    pub fn save<W: Write>(&self, writer: &mut W) -> io::Result<()>
    where
        V: Serialize,
    {
        let snapshot = SnapshotRef {
            version: SNAPSHOT_VERSION,
            config: &self.config,
            nodes: &self.nodes,
        };
        let payload = bincode::serialize(&snapshot).map_err(|e| io::Error::other(e.to_string()))?;
        let crc = crc32fast::hash(&payload);

        writer.write_all(&payload)?;
        writer.write_all(SNAPSHOT_MAGIC)?;
        writer.write_all(&crc.to_be_bytes())?;
        tracing::info!(
            "saved snapshot ({} values, {} bytes, CRC32={:#010x})",
            self.nodes.len(),
            payload.len(),
            crc
        );
        Ok(())
    }

    /// Reads a snapshot back, verifying integrity.
    ///
    /// The caller supplies the distance function; it must be the same
    /// metric the snapshot was built with, since every edge carries a
    /// cached distance.
    pub fn load<R: Read>(reader: &mut R, distance: D) -> io::Result<Self>
    where
        V: DeserializeOwned,
    {
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;
        let len = raw.len();
        if len < 8 || &raw[len - 8..len - 4] != SNAPSHOT_MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "missing snapshot magic",
            ));
        }
        let payload = &raw[..len - 8];
        let stored_crc = u32::from_be_bytes([raw[len - 4], raw[len - 3], raw[len - 2], raw[len - 1]]);
        let computed_crc = crc32fast::hash(payload);
        if computed_crc != stored_crc {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "snapshot CRC mismatch: stored {stored_crc:#010x}, computed {computed_crc:#010x}"
                ),
            ));
        }

        let snapshot: Snapshot<V> =
            bincode::deserialize(payload).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsupported snapshot version {}", snapshot.version),
            ));
        }
        snapshot
            .config
            .validate()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;

        let set = NearSet::from_parts(distance, snapshot.config, snapshot.nodes);
        set.validate()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        tracing::debug!("loaded snapshot ({} values)", set.len());
        Ok(set)
    }
}
