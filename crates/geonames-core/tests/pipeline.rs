//! End-to-end runs over small GeoNames-shaped dumps laid out like the real
//! download directory.
#![cfg(feature = "archive")]

use geonames_core::{
    Dataset, DatasetOutcome, EntityKind, FeatureClasses, HierarchyTree, ImportConfig, Importer,
    MemoryMode, MemoryStore, NodeState,
};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

const EUROPE: i64 = 6255148;
const RUSSIA: i64 = 2017370;
const UKRAINE: i64 = 690791;
const MOSCOW_OBLAST: i64 = 524894;
const MOSCOW: i64 = 524901;
const KYIV_CITY: i64 = 703447;
const KYIV: i64 = 703448;

fn write_zip(path: &Path, member: &str, body: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut zip = zip::ZipWriter::new(fs::File::create(path).unwrap());
    zip.start_file(member, zip::write::FileOptions::default())
        .unwrap();
    zip.write_all(body.as_bytes()).unwrap();
    zip.finish().unwrap();
}

fn object(id: i64, name: &str, class: &str, code: &str, country: &str) -> String {
    format!(
        "{id}\t{name}\t\t\t50.0\t30.0\t{class}\t{code}\t{country}\t\t\t\t\t\t1000\t\t\tEurope/Kyiv\t2020-01-01\n"
    )
}

/// Children are listed before their parents, continents last.
fn objects() -> String {
    [
        object(MOSCOW, "Москва", "P", "PPLC", "RU"),
        object(KYIV, "Київ", "P", "PPLC", "UA"),
        object(MOSCOW_OBLAST, "Moscow Oblast", "A", "ADM1", "RU"),
        object(KYIV_CITY, "Kyiv City", "A", "ADM1", "UA"),
        object(RUSSIA, "Russia", "A", "PCLF", "RU"),
        object(UKRAINE, "Ukraine", "A", "PCLI", "UA"),
        object(2643743, "London", "P", "PPLC", "GB"),
        object(6295630, "Earth", "L", "AREA", ""),
        object(EUROPE, "Europe", "L", "CONT", ""),
    ]
    .concat()
}

fn hierarchy() -> String {
    [
        (6295630, EUROPE),
        (EUROPE, RUSSIA),
        (EUROPE, UKRAINE),
        (RUSSIA, MOSCOW_OBLAST),
        (MOSCOW_OBLAST, MOSCOW),
        (UKRAINE, KYIV_CITY),
        (KYIV_CITY, KYIV),
    ]
    .iter()
    .map(|(p, c)| format!("{p}\t{c}\tADM\n"))
    .collect()
}

fn data_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write_zip(&root.join("dump/hierarchy.zip"), "hierarchy.txt", &hierarchy());
    write_zip(&root.join("dump/allCountries.zip"), "allCountries.txt", &objects());
    write_zip(
        &root.join("dump/alternateNames.zip"),
        "alternateNames.txt",
        "1\t524901\tru\tМосква\t1\t\t\t\n2\t524901\ten\tMoscow\t\t\t\t\n",
    );
    fs::write(
        root.join("dump/countryInfo.txt"),
        "# GeoNames country info\n\
         #ISO\tISO3\tISO-Numeric\tfips\tCountry\n\
         RU\tRUS\t643\tRS\tRussia\tMoscow\t17100000\t140702000\tEU\t.ru\tRUB\tRuble\t7\t######\t^(\\d{6})$\tru,tt\t2017370\tCN,UA\t\n\
         UA\tUKR\t804\tUP\tUkraine\tKyiv\t603700\t45415596\tEU\t.ua\tUAH\tHryvnia\t380\t#####\t^(\\d{5})$\tuk,ru-UA\t690791\tRU,PL\t\n",
    )
    .unwrap();
    write_zip(
        &root.join("zip/allCountries.zip"),
        "allCountries.txt",
        "RU\t101000\tМосква 101\tМосква\t48\t\t\t\t\t55.7522\t37.6156\t4\n\
         DE\t10115\tBerlin\tBerlin\tBE\t\t\t\t\t52.53\t13.38\t4\n\
         UA\t01001\tКиїв\tКиїв\t30\t\t\t\t\t50.45\t30.52\t9\n",
    );
    dir
}

fn config(dir: &Path, mode: MemoryMode) -> ImportConfig {
    ImportConfig {
        data_dir: dir.to_path_buf(),
        memory_mode: mode,
        chunk_size: 2,
        ..ImportConfig::default()
    }
}

#[test]
fn imports_every_dataset_in_tree_order() {
    let dir = data_dir();
    let mut importer = Importer::new(config(dir.path(), MemoryMode::Low), MemoryStore::new()).unwrap();
    let summary = importer.run();

    for report in &summary.reports {
        assert_eq!(report.outcome, DatasetOutcome::Completed, "{report}");
    }
    assert_eq!(summary.entities_created, 7);
    assert_eq!(summary.staged_remaining, 0);
    // root + 7 places; Earth is ignore-listed
    assert_eq!(summary.tree_size, 8);
    assert_eq!(summary.tree_depth, 4);

    let objects = summary.report(Dataset::Objects).unwrap();
    assert_eq!(objects.counters.total_seen, 9);
    assert_eq!(objects.counters.imported, 7);
    assert_eq!(objects.counters.ignored, 2);

    let postal = summary.report(Dataset::PostalCodes).unwrap();
    assert_eq!(
        (postal.counters.imported, postal.counters.ignored, postal.counters.errored),
        (1, 1, 1)
    );
    assert_eq!(summary.report(Dataset::Countries).unwrap().counters.imported, 2);
    assert_eq!(summary.report(Dataset::Translations).unwrap().counters.imported, 1);

    let countries = fs::read_to_string(dir.path().join("dump/countryInfo.txt")).unwrap();
    assert!(!countries.starts_with('#'));
    assert_eq!(countries.lines().count(), 2);

    let (tree, store) = importer.into_parts();
    assert_eq!(tree.state(KYIV), NodeState::Created);

    let moscow = store.get(MOSCOW).unwrap();
    assert_eq!(moscow.record.asciiname, "Moskva");
    assert_eq!(moscow.depth(), 4);
    assert_eq!(
        store.ancestors(MOSCOW).iter().map(|e| e.id).collect::<Vec<_>>(),
        vec![EUROPE, RUSSIA, MOSCOW_OBLAST]
    );
    assert_eq!(store.get(KYIV).unwrap().parent, Some(KYIV_CITY));

    let classes = FeatureClasses::default();
    assert_eq!(store.of_kind(EntityKind::Continent, &classes).len(), 1);
    assert_eq!(store.of_kind(EntityKind::Country, &classes).len(), 2);
    assert_eq!(store.of_kind(EntityKind::City, &classes).len(), 2);
}

#[test]
fn memory_modes_produce_the_same_store() {
    let dir = data_dir();
    let mut paths = Vec::new();

    for mode in [MemoryMode::Low, MemoryMode::Normal, MemoryMode::Max] {
        let mut importer = Importer::new(config(dir.path(), mode), MemoryStore::new()).unwrap();
        importer.run();
        let (_, store) = importer.into_parts();
        let mut entities: Vec<(i64, String)> = [EUROPE, RUSSIA, UKRAINE, MOSCOW_OBLAST, MOSCOW, KYIV_CITY, KYIV]
            .iter()
            .map(|id| (*id, store.get(*id).unwrap().path.clone()))
            .collect();
        entities.sort();
        paths.push(entities);
    }

    assert_eq!(paths[0], paths[1]);
    assert_eq!(paths[1], paths[2]);
}

#[test]
fn snapshots_resume_an_import() {
    let dir = data_dir();
    let tree_path = dir.path().join("tree.bin");
    let store_path = dir.path().join("store.bin");

    let mut first = ImportConfig {
        data_dir: dir.path().to_path_buf(),
        ..ImportConfig::default()
    };
    first.objects.enabled = false;
    let mut importer = Importer::new(first.clone(), MemoryStore::new()).unwrap();
    importer.run_dataset(Dataset::Hierarchy);
    importer.tree().save(&tree_path).unwrap();

    let tree = HierarchyTree::load(&tree_path).unwrap();
    assert_eq!(&tree, importer.tree());

    let mut second = first;
    second.hierarchy.enabled = false;
    second.objects.enabled = true;
    let mut resumed = Importer::with_tree(second, tree, MemoryStore::new()).unwrap();
    let summary = resumed.run();
    assert_eq!(summary.entities_created, 7);

    resumed.store().save(&store_path).unwrap();
    let store = MemoryStore::load(&store_path).unwrap();
    assert_eq!(store.len(), 7);
    assert_eq!(store.roots().len(), 1);
}

#[test]
fn continents_filtered_out_leave_subtrees_staged() {
    let dir = data_dir();
    let mut config = config(dir.path(), MemoryMode::Normal);
    config.objects.filter = geonames_core::AllowList::new().with("country_code", ["RU", "UA"]);

    let mut importer = Importer::new(config, MemoryStore::new()).unwrap();
    let summary = importer.run();

    assert_eq!(summary.entities_created, 0);
    assert_eq!(summary.staged_remaining, 6);
    assert_eq!(importer.tree().state(RUSSIA), NodeState::Staged);
}
