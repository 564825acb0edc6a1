use std::ops::RangeInclusive;

/// Where a token key's postings live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Routing disabled: everything goes to the primary store.
    Primary,
    /// Shard `<path>.<i>`.
    Shard(u32),
    /// The residue falls outside this engine's shard slice; drop on
    /// insert, ignore on query.
    Skip,
}

/// Splits postings across sibling stores by the token key's second byte.
///
/// A `submax` at or past `subcount` collapses to the explicit disabled
/// state rather than routing with a bogus modulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Router {
    Disabled,
    Enabled {
        subcount: u32,
        submin: u32,
        submax: u32,
    },
}

impl Router {
    pub fn new(subcount: u32, submin: u32, submax: u32) -> Router {
        if subcount == 0 || submax >= subcount {
            Router::Disabled
        } else {
            Router::Enabled {
                subcount,
                submin,
                submax,
            }
        }
    }

    pub fn route(&self, key: &[u8]) -> Route {
        match *self {
            Router::Disabled => Route::Primary,
            Router::Enabled {
                subcount,
                submin,
                submax,
            } => {
                let residue = key[1] as u32 % subcount;
                if residue >= submin && residue <= submax {
                    Route::Shard(residue)
                } else {
                    Route::Skip
                }
            }
        }
    }

    /// Shards this engine must open, if routing is enabled.
    pub fn shard_range(&self) -> Option<RangeInclusive<u32>> {
        match *self {
            Router::Disabled => None,
            Router::Enabled { submin, submax, .. } => Some(submin..=submax),
        }
    }
}
