#![allow(clippy::unwrap_used, clippy::expect_used, missing_docs)]

mod common;

use std::path::Path;
use std::sync::{Arc, Mutex};

use fs_namespace::NamespaceError;
use fs_namespace::fs::FileAttributes;
use fs_namespace::idl::{ItemId, ItemIdList};
use fs_namespace::namespace::{
    BindRequest, ClassBinder, ContentMask, DriveFolder, FolderServices, FsFolder, NamespaceFolder,
    PersistFolder as _,
};
use fs_namespace::overrides::IconLocation;
use fs_namespace::registry::{
    ClassId, KEY_CLSID, KEY_DROP_HANDLER, KEY_ICON_HANDLER, StaticTypeRegistry,
};

use common::{folder_at, sample_tree, services, services_with};

const VIEWER: &str = "{6C7A5E0B-2B41-4F7C-9A53-0D5C1F0E8A11}";

fn class(text: &str) -> ClassId {
    text.parse().unwrap()
}

fn ids(folder: &dyn NamespaceFolder, text: &str) -> ItemIdList {
    folder.parse(text, None, None).unwrap().ids
}

#[test]
fn binds_child_folders() {
    let fs = sample_tree();
    let folder = folder_at(&services(&fs), "/data");

    let docs = ids(&folder, "docs");
    let child = folder.bind(&docs).unwrap();
    assert_eq!(child.class_id(), ClassId::FS_FOLDER);
    assert_eq!(child.path(), Some(Path::new("/data/docs")));
    assert_eq!(child.current_folder(), folder.current_folder().concat(&docs));

    let listed: Vec<_> = child
        .enumerate(ContentMask::FOLDERS)
        .unwrap()
        .map(|id| id.name().unwrap().to_owned())
        .collect();
    assert_eq!(listed, ["nested"]);

    let nested = folder.bind(&ids(&folder, "docs/nested")).unwrap();
    assert_eq!(nested.path(), Some(Path::new("/data/docs/nested")));
    assert_eq!(nested.current_folder().len(), 4);
}

#[test]
fn files_need_a_registered_handler() {
    let fs = sample_tree();
    fs.add_file("/data/bundle.zip", 64);

    let plain = folder_at(&services(&fs), "/data");
    assert!(matches!(
        plain.bind(&ids(&plain, "bundle.zip")),
        Err(NamespaceError::NotFound(_))
    ));
    assert!(matches!(
        plain.bind(&ids(&plain, "readme")),
        Err(NamespaceError::NotFound(_))
    ));

    let registry = StaticTypeRegistry::new()
        .with_prog_id(".zip", "CompressedFolder")
        .with_prog_id_handler("CompressedFolder", KEY_CLSID, ClassId::FS_FOLDER);
    let folder = folder_at(&services_with(&fs, registry), "/data");
    let opened = folder.bind(&ids(&folder, "bundle.zip")).unwrap();
    assert_eq!(opened.path(), Some(Path::new("/data/bundle.zip")));
}

#[test]
fn unknown_handler_classes_are_not_found() {
    let fs = sample_tree();
    let registry = StaticTypeRegistry::new().with_handler(".txt", KEY_CLSID, class(VIEWER));
    let folder = folder_at(&services_with(&fs, registry), "/data");

    assert!(matches!(
        folder.bind(&ids(&folder, "alpha.txt")),
        Err(NamespaceError::NotFound(_))
    ));
}

#[test]
fn blocked_handlers_are_denied() {
    let fs = sample_tree();
    let registry = StaticTypeRegistry::new()
        .with_handler(".txt", KEY_CLSID, class(VIEWER))
        .with_blocked(class(VIEWER));
    let folder = folder_at(&services_with(&fs, registry), "/data");

    let err = folder.bind(&ids(&folder, "alpha.txt")).unwrap_err();
    assert!(matches!(err, NamespaceError::AccessDenied(c) if c == class(VIEWER)));
    assert_eq!(i32::from(err), libc::EACCES);
}

#[test]
fn registered_factories_build_custom_classes() {
    let fs = sample_tree();
    let seen: Arc<Mutex<Vec<BindRequest>>> = Arc::default();
    let log = seen.clone();
    let binder = ClassBinder::new().with(
        class(VIEWER),
        Box::new(move |services: &FolderServices, request: BindRequest| {
            log.lock().unwrap().push(request.clone());
            FsFolder::create(services, request)
        }),
    );
    let registry = StaticTypeRegistry::new().with_handler(".txt", KEY_CLSID, class(VIEWER));
    let services = services_with(&fs, registry).with_binder(Arc::new(binder));
    let folder = folder_at(&services, "/data");

    let alpha = ids(&folder, "alpha.txt");
    folder.bind(&alpha).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].root, folder.current_folder().concat(&alpha));
    assert_eq!(seen[0].path.as_deref(), Some(Path::new("/data/alpha.txt")));
}

#[test]
fn descriptor_overrides_system_folders_only() {
    let fs = sample_tree();
    fs.add_dir("/data/special").add_text(
        "/data/special/desktop.ini",
        &format!(
            "[.ShellClassInfo]\nCLSID={VIEWER}\nIconFile=icons.dll\nIconIndex=4\n"
        ),
    );
    let seen: Arc<Mutex<usize>> = Arc::default();
    let count = seen.clone();
    let binder = ClassBinder::new().with(
        class(VIEWER),
        Box::new(move |services: &FolderServices, request: BindRequest| {
            *count.lock().unwrap() += 1;
            FsFolder::create(services, request)
        }),
    );
    let services = services(&fs).with_binder(Arc::new(binder));

    let folder = folder_at(&services, "/data");

    // Without the system or read-only bit the descriptor is ignored.
    let special = ids(&folder, "special");
    folder.bind(&special).unwrap();
    assert_eq!(*seen.lock().unwrap(), 0);
    assert_eq!(folder.icon_override(special.first().unwrap()), None);

    fs.set_attributes("/data/special", FileAttributes::SYSTEM);
    let special = ids(&folder, "special");
    let child = folder.bind(&special).unwrap();
    assert_eq!(*seen.lock().unwrap(), 1);
    assert_eq!(child.path(), Some(Path::new("/data/special")));
    assert_eq!(
        folder.icon_override(special.first().unwrap()),
        Some(IconLocation {
            file: "icons.dll".to_owned(),
            index: 4,
        })
    );
}

#[test]
fn handler_lookup_covers_extra_keys() {
    let fs = sample_tree();
    let registry = StaticTypeRegistry::new()
        .with_handler(".txt", KEY_DROP_HANDLER, class(VIEWER))
        .with_handler(".txt", KEY_ICON_HANDLER, ClassId::FS_FOLDER);
    let services = services_with(&fs, registry);
    let folder = folder_at(&services, "/data");
    let mut lookup = FsFolder::new(services.clone());
    lookup.initialize(folder.current_folder()).unwrap();

    let alpha = ids(&folder, "alpha.txt");
    let alpha = alpha.first().unwrap();
    assert_eq!(
        lookup.handler_for(alpha, KEY_DROP_HANDLER).unwrap(),
        Some(class(VIEWER))
    );
    assert_eq!(
        lookup.handler_for(alpha, KEY_ICON_HANDLER).unwrap(),
        Some(ClassId::FS_FOLDER)
    );
    assert_eq!(lookup.handler_for(alpha, KEY_CLSID).unwrap(), None);

    let docs = ids(&folder, "docs");
    assert_eq!(
        lookup
            .handler_for(docs.first().unwrap(), KEY_DROP_HANDLER)
            .unwrap(),
        None,
        "folders have no file-type handlers"
    );
}

#[test]
fn storage_binding_is_unsupported() {
    let fs = sample_tree();
    let folder = folder_at(&services(&fs), "/data");

    assert!(matches!(
        folder.bind_to_storage(&ids(&folder, "docs")),
        Err(NamespaceError::NotImplemented(_))
    ));
    let drives = DriveFolder::new(services(&fs));
    assert!(matches!(
        drives.bind_to_storage(&ItemIdList::new()),
        Err(NamespaceError::NotImplemented(_))
    ));
}

#[test]
fn malformed_binds_are_rejected() {
    let fs = sample_tree();
    let services = services(&fs);
    let folder = folder_at(&services, "/data");
    let docs = ids(&folder, "docs");

    assert!(matches!(
        folder.bind(&ItemIdList::new()),
        Err(NamespaceError::InvalidArgument(_))
    ));
    assert!(matches!(
        FsFolder::new(services.clone()).bind(&docs),
        Err(NamespaceError::InvalidArgument(_))
    ));
    assert!(matches!(
        folder.bind(&ItemIdList::from_id(ItemId::foreign(0x70, b"x").unwrap())),
        Err(NamespaceError::InvalidArgument(_))
    ));
    assert!(matches!(
        DriveFolder::new(services).bind(&docs),
        Err(NamespaceError::InvalidArgument(_))
    ));
}
