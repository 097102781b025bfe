#![allow(clippy::unwrap_used, clippy::expect_used, missing_docs)]

mod common;

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use fs_namespace::NamespaceError;
use fs_namespace::fs::HostFs;
use fs_namespace::idl::{ItemData, ItemId, ItemIdList};
use fs_namespace::namespace::{
    BindRequest, Capabilities, ClassBinder, ContentMask, DriveFolder, FolderServices,
    NamespaceFolder as _, SortColumn, open_folder, resolve_item, split_root,
};
use fs_namespace::registry::{ClassId, StaticTypeRegistry};

use common::{sample_tree, services};

#[test]
fn roots_split_off_absolute_text() {
    assert_eq!(split_root("/data/docs"), Some(("/".to_owned(), "data/docs")));
    assert_eq!(split_root("\\data"), Some(("/".to_owned(), "data")));
    assert_eq!(split_root("c:\\Windows"), Some(("C:\\".to_owned(), "Windows")));
    assert_eq!(split_root("D:"), Some(("D:\\".to_owned(), "")));
    assert_eq!(split_root("relative/path"), None);
    assert_eq!(split_root(""), None);
}

#[test]
fn parses_through_the_root_into_filesystem_folders() {
    let fs = sample_tree();
    let drives = DriveFolder::new(services(&fs));

    let parsed = drives
        .parse("/data/alpha.txt", None, Some(Capabilities::STREAM))
        .unwrap();
    assert_eq!(parsed.ids.len(), 3);
    assert!(matches!(
        parsed.ids.first().unwrap().data(),
        ItemData::Drive { root: "/" }
    ));
    assert_eq!(parsed.ids.last().unwrap().name(), Some("alpha.txt"));
    assert_eq!(parsed.attributes, Some(Capabilities::STREAM));
    assert_eq!(parsed.consumed, "/data/alpha.txt".len());

    let root = drives.parse("/", None, Some(Capabilities::FOLDER)).unwrap();
    assert_eq!(root.ids.len(), 1);
    assert_eq!(root.attributes, Some(Capabilities::FOLDER));
}

#[test]
fn unknown_roots_are_not_found() {
    let fs = sample_tree();
    let drives = DriveFolder::new(services(&fs));

    assert!(matches!(
        drives.parse("Q:\\anything", None, None),
        Err(NamespaceError::NotFound(_))
    ));
    assert!(matches!(
        drives.parse("anything", None, None),
        Err(NamespaceError::InvalidArgument(_))
    ));
    assert!(matches!(
        drives.parse("", None, None),
        Err(NamespaceError::InvalidArgument(_))
    ));
}

#[cfg(unix)]
#[test]
fn enumerates_the_single_unix_root() {
    let fs = sample_tree();
    let drives = DriveFolder::new(services(&fs));

    let roots: Vec<_> = drives
        .enumerate(ContentMask::FOLDERS)
        .unwrap()
        .map(|id| match id.data() {
            ItemData::Drive { root } => root.to_owned(),
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(roots, ["/"]);
    assert_eq!(drives.enumerate(ContentMask::NON_FOLDERS).unwrap().len(), 0);
}

#[test]
fn compares_roots_then_delegates() {
    let fs = sample_tree();
    let drives = DriveFolder::new(services(&fs));
    let c = ItemIdList::from_id(ItemId::drive("C:\\").unwrap());
    let d = ItemIdList::from_id(ItemId::drive("d:\\").unwrap());
    let name = SortColumn::Name.index();

    assert_eq!(drives.compare(name, &c, &d).unwrap(), Ordering::Less);
    assert_eq!(drives.compare(name, &d, &c).unwrap(), Ordering::Greater);
    assert_eq!(drives.compare(name, &c, &c).unwrap(), Ordering::Equal);

    let alpha = drives.parse("/data/alpha.txt", None, None).unwrap().ids;
    let beta = drives.parse("/data/Beta.TXT", None, None).unwrap().ids;
    let data = drives.parse("/data", None, None).unwrap().ids;
    assert_eq!(drives.compare(name, &alpha, &beta).unwrap(), Ordering::Less);
    assert_eq!(drives.compare(name, &data, &alpha).unwrap(), Ordering::Less);

    assert!(matches!(
        drives.compare(9, &c, &d),
        Err(NamespaceError::InvalidArgument(_))
    ));
}

#[test]
fn the_drive_list_is_the_namespace_root() {
    let fs = sample_tree();
    let services = services(&fs);
    let drives = DriveFolder::new(services.clone());

    assert_eq!(drives.class_id(), ClassId::DRIVES_FOLDER);
    assert!(drives.current_folder().is_empty());
    assert_eq!(drives.path(), None);

    let built = services
        .binder
        .bind(
            &services,
            ClassId::DRIVES_FOLDER,
            BindRequest {
                root: ItemIdList::new(),
                path: None,
            },
        )
        .unwrap();
    assert_eq!(built.class_id(), ClassId::DRIVES_FOLDER);

    assert!(matches!(
        services.binder.bind_parent(&services, &ItemIdList::new()),
        Err(NamespaceError::InvalidArgument(_))
    ));
}

#[test]
fn unregistered_classes_cannot_be_bound() {
    let fs = sample_tree();
    let binder = ClassBinder::empty();
    assert!(!binder.is_registered(ClassId::FS_FOLDER));
    let services = services(&fs).with_binder(Arc::new(binder));

    assert!(ClassBinder::new().is_registered(ClassId::FS_FOLDER));
    assert!(matches!(
        DriveFolder::new(services).parse("/data", None, None),
        Err(NamespaceError::NotFound(_))
    ));
}

#[test]
fn opens_and_resolves_real_paths() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("inner")).unwrap();
    std::fs::write(dir.path().join("inner").join("leaf.txt"), "x").unwrap();
    let services = FolderServices::new(Arc::new(HostFs), Arc::new(StaticTypeRegistry::new()));

    let inner = open_folder(&services, &dir.path().join("inner")).unwrap();
    assert_eq!(inner.path(), Some(dir.path().join("inner").as_path()));
    let children = inner.enumerate(ContentMask::NON_FOLDERS).unwrap();
    assert_eq!(children.items()[0].name(), Some("leaf.txt"));

    let (parent, leaf) = resolve_item(&services, &dir.path().join("inner/leaf.txt")).unwrap();
    assert_eq!(parent.path(), inner.path());
    assert_eq!(leaf.name(), Some("leaf.txt"));
    assert!(matches!(
        resolve_item(&services, Path::new("relative")),
        Err(NamespaceError::InvalidArgument(_))
    ));
}
