use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub path: PathBuf,
    pub page_size: usize,      // store I/O buffer size
    pub cache_size: usize,     // query-result cache budget
    pub read_only: bool,

    pub subcount: u32,         // shard count; 0 disables routing
    pub submin: u32,           // first shard this engine serves
    pub submax: Option<u32>,   // last shard; defaults to subcount - 1
}

impl Config {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Config {
            path: path.into(),
            ..Config::default()
        }
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size;
        self
    }

    /// Restrict this engine to shards `submin..=submax` of a
    /// `subcount`-way split index.
    pub fn shards(mut self, subcount: u32, submin: u32, submax: Option<u32>) -> Self {
        self.subcount = subcount;
        self.submin = submin;
        self.submax = submax;
        self
    }

    /// Effective upper shard bound.
    pub fn submax_or_default(&self) -> u32 {
        self.submax.unwrap_or(self.subcount.saturating_sub(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            path: PathBuf::from("./data/index"),
            page_size: 4 * 1024,                // 4KB I/O buffer
            cache_size: 16 * 1024 * 1024,       // 16MB cache budget
            read_only: false,
            subcount: 0,                        // routing disabled
            submin: 0,
            submax: None,
        }
    }
}
