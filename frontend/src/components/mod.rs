pub mod resident_importer;
