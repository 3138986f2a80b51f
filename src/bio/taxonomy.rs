//! Taxonomy lookups backing taxon naming and rank checks
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Standard taxonomic ranks from kingdom to species
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaxonomicRank {
    Superkingdom,
    Kingdom,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
    Subspecies,
    Strain,
    NoRank,
}

impl From<&str> for TaxonomicRank {
    /// Parse rank from NCBI taxonomy string
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "superkingdom" => Self::Superkingdom,
            "kingdom" => Self::Kingdom,
            "phylum" => Self::Phylum,
            "class" => Self::Class,
            "order" => Self::Order,
            "family" => Self::Family,
            "genus" => Self::Genus,
            "species" => Self::Species,
            "subspecies" => Self::Subspecies,
            "strain" | "varietas" | "forma" => Self::Strain,
            _ => Self::NoRank,
        }
    }
}

/// Name and rank lookups by NCBI taxonomy ID. Absence is a normal answer.
pub trait TaxonomyLookup {
    /// Scientific name of the taxon
    fn lookup_name(&self, taxon_id: u32) -> Option<String>;

    /// Rank string as recorded in the taxonomy (e.g. "species", "no rank")
    fn lookup_rank(&self, taxon_id: u32) -> Option<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyInfo {
    pub taxon_id: u32,
    pub scientific_name: String,
    pub rank: String,
    pub parent_id: Option<u32>,
}

/// In-memory taxonomy. An empty database answers every lookup with `None`.
#[derive(Debug, Default)]
pub struct TaxonomyDB {
    taxa: HashMap<u32, TaxonomyInfo>,
}

impl TaxonomyDB {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `names.dmp` and `nodes.dmp` from an NCBI taxdump directory
    pub fn load_ncbi_dump<P: AsRef<Path>>(dir: P) -> std::io::Result<Self> {
        let dir = dir.as_ref();
        ncbi::build_taxonomy_db(dir.join("names.dmp"), dir.join("nodes.dmp"))
    }

    pub fn add_taxon(&mut self, info: TaxonomyInfo) {
        self.taxa.insert(info.taxon_id, info);
    }

    pub fn get_taxon(&self, taxon_id: u32) -> Option<&TaxonomyInfo> {
        self.taxa.get(&taxon_id)
    }

    pub fn taxa_count(&self) -> usize {
        self.taxa.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taxa.is_empty()
    }

    /// Get the taxonomic rank of a taxon
    pub fn get_rank(&self, taxon_id: u32) -> Option<TaxonomicRank> {
        self.taxa
            .get(&taxon_id)
            .map(|info| TaxonomicRank::from(info.rank.as_str()))
    }
}

impl TaxonomyLookup for TaxonomyDB {
    fn lookup_name(&self, taxon_id: u32) -> Option<String> {
        self.get_taxon(taxon_id).map(|t| t.scientific_name.clone())
    }

    fn lookup_rank(&self, taxon_id: u32) -> Option<String> {
        self.get_taxon(taxon_id).map(|t| t.rank.clone())
    }
}

/// Parse NCBI taxonomy dump files
pub mod ncbi {
    use super::*;
    use std::fs::File;
    use std::io::{BufRead, BufReader};

    pub fn load_names<P: AsRef<Path>>(path: P) -> Result<HashMap<u32, String>, std::io::Error> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut names = HashMap::new();

        for line in reader.lines() {
            let line = line?;
            let parts: Vec<&str> = line.split("\t|\t").collect();

            if parts.len() >= 4 && parts[3].trim_end_matches("\t|") == "scientific name" {
                if let Ok(taxon_id) = parts[0].parse::<u32>() {
                    names.insert(taxon_id, parts[1].to_string());
                }
            }
        }

        Ok(names)
    }

    pub fn load_nodes<P: AsRef<Path>>(
        path: P,
    ) -> Result<HashMap<u32, (u32, String)>, std::io::Error> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut nodes = HashMap::new();

        for line in reader.lines() {
            let line = line?;
            let parts: Vec<&str> = line.split("\t|\t").collect();

            if parts.len() >= 3 {
                if let (Ok(taxon_id), Ok(parent_id)) =
                    (parts[0].parse::<u32>(), parts[1].parse::<u32>())
                {
                    let rank = parts[2].trim_end_matches("\t|").to_string();
                    nodes.insert(taxon_id, (parent_id, rank));
                }
            }
        }

        Ok(nodes)
    }

    pub fn build_taxonomy_db<P: AsRef<Path>>(
        names_path: P,
        nodes_path: P,
    ) -> Result<TaxonomyDB, std::io::Error> {
        let names = load_names(names_path)?;
        let nodes = load_nodes(nodes_path)?;

        let mut db = TaxonomyDB::new();

        for (taxon_id, name) in names {
            if let Some((parent_id, rank)) = nodes.get(&taxon_id) {
                db.add_taxon(TaxonomyInfo {
                    taxon_id,
                    scientific_name: name,
                    rank: rank.clone(),
                    parent_id: if *parent_id == taxon_id {
                        None
                    } else {
                        Some(*parent_id)
                    },
                });
            }
        }

        Ok(db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const NAMES: &str = "1\t|\troot\t|\t\t|\tscientific name\t|\n\
9606\t|\tHomo sapiens\t|\t\t|\tscientific name\t|\n\
9606\t|\thuman\t|\t\t|\tgenbank common name\t|\n\
9605\t|\tHomo\t|\t\t|\tscientific name\t|\n";

    const NODES: &str = "1\t|\t1\t|\tno rank\t|\n\
9606\t|\t9605\t|\tspecies\t|\n\
9605\t|\t1\t|\tgenus\t|\n";

    #[test]
    fn test_load_ncbi_dump() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("names.dmp"), NAMES).unwrap();
        fs::write(dir.path().join("nodes.dmp"), NODES).unwrap();

        let db = TaxonomyDB::load_ncbi_dump(dir.path()).unwrap();
        assert_eq!(db.taxa_count(), 3);
        assert_eq!(db.lookup_name(9606).as_deref(), Some("Homo sapiens"));
        assert_eq!(db.lookup_rank(9606).as_deref(), Some("species"));
        assert_eq!(db.get_rank(9605), Some(TaxonomicRank::Genus));
        assert_eq!(db.get_taxon(1).unwrap().parent_id, None);
        assert_eq!(db.lookup_name(42), None);
    }

    #[test]
    fn test_missing_dump_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TaxonomyDB::load_ncbi_dump(dir.path()).is_err());
    }

    #[test]
    fn test_rank_parsing() {
        assert_eq!(TaxonomicRank::from("Species"), TaxonomicRank::Species);
        assert_eq!(TaxonomicRank::from("varietas"), TaxonomicRank::Strain);
        assert_eq!(TaxonomicRank::from("clade"), TaxonomicRank::NoRank);
    }
}
