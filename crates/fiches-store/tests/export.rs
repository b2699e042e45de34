use fiches_import::{detect_format, HeaderKind, ImportOptions, InputFormat};
use fiches_store::{FicheStore, StoreOptions};

#[test]
fn exported_document_reimports_unchanged() {
    let source = FicheStore::open_in_memory(StoreOptions::default());
    source
        .import("Fiche 1\nNom: DUPONT\nMobile: 06 12 34 56 78\n\nFiche 2\nNom: MARTIN\nPortable: 07 12 34 56 78\n")
        .expect("import");
    source
        .import("Famille LEROY 01 23 45 67 89 ou 06 98 76 54 32")
        .expect("import");
    assert_eq!(source.len(), 4);

    let document = source.export_text();
    assert_eq!(
        detect_format(&document, &ImportOptions::default()),
        InputFormat::LabeledBlock(HeaderKind::ExportDelimiter)
    );
    assert!(document.starts_with("===== 0123456789 =====\n"));

    let target = FicheStore::open_in_memory(StoreOptions::default());
    let report = target.import(&document).expect("reimport");
    assert_eq!(report.added, 4);
    assert_eq!(*target.snapshot(), *source.snapshot());

    let again = source.import(&document).expect("self import");
    assert!(!again.is_mutated());
}
