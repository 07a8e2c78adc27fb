//! Tests for config module

#[cfg(test)]
mod tests {
    use crate::config::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = AnnidxConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.hnsw.m, 16);
        assert_eq!(cfg.hnsw.ef_construction, 64);
        assert_eq!(cfg.hnsw.ef_search, 40);
        assert_eq!(cfg.ivfflat.lists, 100);
        assert_eq!(cfg.ivfflat.probes, 1);
        assert_eq!(cfg.storage.page_size, 8192);
    }

    #[test]
    fn test_rejects_m_out_of_range() {
        let mut cfg = AnnidxConfig::default();
        cfg.hnsw.m = 1;
        assert!(cfg.validate().is_err());
        cfg.hnsw.m = 101;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_ef_construction_out_of_range() {
        let mut cfg = AnnidxConfig::default();
        cfg.hnsw.ef_construction = 3;
        assert!(cfg.validate().is_err());
        cfg.hnsw.ef_construction = 1001;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_lists_out_of_range() {
        let mut cfg = AnnidxConfig::default();
        cfg.ivfflat.lists = 0;
        assert!(cfg.validate().is_err());
        cfg.ivfflat.lists = 32769;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_invalid_log_level() {
        let mut cfg = AnnidxConfig::default();
        cfg.logging.level = "verbose".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_from_toml_overrides_defaults() {
        let toml_str = r#"
            [hnsw]
            m = 32
            ef_construction = 200
            ef_search = 80

            [ivfflat]
            lists = 500
            probes = 10
        "#;
        let cfg = AnnidxConfig::from_toml(toml_str).unwrap();
        assert_eq!(cfg.hnsw.m, 32);
        assert_eq!(cfg.hnsw.ef_construction, 200);
        assert_eq!(cfg.ivfflat.lists, 500);
        assert_eq!(cfg.ivfflat.probes, 10);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_round_trip_to_toml() {
        let cfg = AnnidxConfig::default();
        let toml_str = cfg.to_toml().unwrap();
        let reparsed = AnnidxConfig::from_toml(&toml_str).unwrap();
        assert_eq!(reparsed.hnsw.m, cfg.hnsw.m);
        assert_eq!(reparsed.ivfflat.lists, cfg.ivfflat.lists);
    }
}
