use tally_core::db::open_db_in_memory;
use tally_core::{
    Installation, InstallationContext, InstallationRepository, RepoError,
    SqliteInstallationRepository, SqliteUserRepository, User, UserRepository,
};

#[test]
fn make_user_allocates_id_and_roundtrips() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::new(&conn);

    let user = repo.make_user("Mirko").unwrap();
    assert!(user.is_valid());
    assert_eq!(user.name, "Mirko");
    assert_eq!(repo.get_user(user.id).unwrap(), Some(user.clone()));

    let other = repo.make_user("Frank").unwrap();
    assert_ne!(other.id, user.id);
    assert_eq!(repo.get_all_users().unwrap(), vec![user, other]);
}

#[test]
fn modify_and_delete_user() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::new(&conn);

    let mut user = repo.make_user("draft").unwrap();
    user.name = "renamed".to_string();
    assert!(repo.modify_user(&user).unwrap());
    assert_eq!(repo.get_user(user.id).unwrap().unwrap().name, "renamed");

    assert!(repo.delete_user(&user).unwrap());
    assert!(repo.get_user(user.id).unwrap().is_none());
    assert!(!repo.delete_user(&user).unwrap());
}

#[test]
fn add_user_with_known_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::new(&conn);

    repo.add_user(&User::new(500, "imported")).unwrap();
    assert_eq!(repo.get_user(500).unwrap().unwrap().name, "imported");

    let err = repo.add_user(&User::default()).unwrap_err();
    assert!(matches!(err, RepoError::InvalidEntity(_)));
}

#[test]
fn create_installation_allocates_immutable_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteInstallationRepository::new(&conn);

    let installation = repo.create_installation("laptop").unwrap();
    assert!(installation.is_valid());

    let renamed = Installation {
        name: "old laptop".to_string(),
        ..installation.clone()
    };
    assert!(repo.modify_installation(&renamed).unwrap());

    let stored = repo.get_installation(installation.id).unwrap().unwrap();
    assert_eq!(stored.id, installation.id);
    assert_eq!(stored.name, "old laptop");
    assert_eq!(
        stored.context(),
        InstallationContext::new(installation.id)
    );
}

#[test]
fn add_installation_rejects_duplicates() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteInstallationRepository::new(&conn);

    let imported = Installation::new(9, "server");
    repo.add_installation(&imported).unwrap();
    let err = repo.add_installation(&imported).unwrap_err();
    assert!(matches!(err, RepoError::InvalidEntity(_)));
    assert_eq!(repo.get_all_installations().unwrap(), vec![imported]);
}

#[test]
fn create_installation_skips_an_imported_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteInstallationRepository::new(&conn);

    let imported = Installation::new(2, "imported");
    repo.add_installation(&imported).unwrap();
    let local = repo.create_installation("local").unwrap();

    assert!(local.is_valid());
    assert_ne!(local.id, imported.id);
    let holders: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM Installations WHERE inst_id = ?1;",
            [imported.id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(holders, 1);
    assert_eq!(repo.get_installation(local.id).unwrap(), Some(local));
}

#[test]
fn make_user_skips_an_imported_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::new(&conn);

    repo.add_user(&User::new(2, "imported")).unwrap();
    let made = repo.make_user("local").unwrap();

    assert_ne!(made.id, 2);
    assert_eq!(repo.get_all_users().unwrap().len(), 2);
}

#[test]
fn delete_installation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteInstallationRepository::new(&conn);

    let installation = repo.create_installation("tmp").unwrap();
    assert!(repo.delete_installation(&installation).unwrap());
    assert!(repo.get_installation(installation.id).unwrap().is_none());
    assert!(repo.get_installation(0).unwrap().is_none());
}
