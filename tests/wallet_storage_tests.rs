//! 钱包存储集成测试
//!
//! 覆盖生成/加载往返、密码错误、派生链追赶、旧格式迁移、备份、只读导出和并发派生

mod common;

use std::collections::HashSet;

use common::{backup_count, settings, storage_at, storage_with, wallet_path, PASSWORD};
use tempfile::TempDir;
use walletstore::codec::{self, KeySecret, WalletFile};
use walletstore::domain::{Address, WalletVersion};
use walletstore::infrastructure::hashing::HashVariant;
use walletstore::infrastructure::PasswordCipher;
use walletstore::service::address_deriver;
use walletstore::WalletError;

#[test]
fn test_generate_then_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = wallet_path(&dir);

    let generated = storage_at(&path).generate(PASSWORD).unwrap();
    assert_eq!(generated.version, WalletVersion::V2);

    let store = storage_at(&path);
    store.load(PASSWORD).unwrap();
    assert_eq!(store.primary_address().unwrap(), generated.address);
    assert_eq!(store.primary_public_key().unwrap(), generated.public_key);
    assert_eq!(store.version().unwrap(), WalletVersion::V2);
    assert!(!store.is_viewing().unwrap());
    assert_eq!(store.my_addresses().unwrap(), vec![generated.address.clone()]);
    assert_eq!(store.last_address().unwrap(), generated.address);

    let entry = store.address_entry(&generated.address).unwrap().unwrap();
    assert!(entry.is_primary());
}

#[test]
fn test_wrong_password_leaves_store_unloaded() {
    let dir = TempDir::new().unwrap();
    let path = wallet_path(&dir);
    storage_at(&path).generate(PASSWORD).unwrap();

    let store = storage_at(&path);
    assert!(matches!(
        store.load("not the right password"),
        Err(WalletError::WrongPassword)
    ));
    assert!(!store.is_loaded());
    assert!(matches!(store.my_addresses(), Err(WalletError::NotLoaded)));

    store.load(PASSWORD).unwrap();
    assert!(store.is_loaded());
}

#[test]
fn test_verify_does_not_load() {
    let dir = TempDir::new().unwrap();
    let path = wallet_path(&dir);
    storage_at(&path).generate(PASSWORD).unwrap();

    let store = storage_at(&path);
    store.verify(PASSWORD).unwrap();
    assert!(!store.is_loaded());
    assert!(matches!(
        store.verify("not the right password"),
        Err(WalletError::WrongPassword)
    ));
}

#[test]
fn test_unsupported_version() {
    let dir = TempDir::new().unwrap();
    let path = wallet_path(&dir);
    std::fs::write(&path, 7i32.to_le_bytes()).unwrap();

    let store = storage_at(&path);
    assert!(matches!(
        store.load(PASSWORD),
        Err(WalletError::UnsupportedVersion(7))
    ));
}

#[test]
fn test_preview_is_pure() {
    let dir = TempDir::new().unwrap();
    let store = storage_at(&wallet_path(&dir));
    let generated = store.generate(PASSWORD).unwrap();
    let before = std::fs::read(store.path()).unwrap();

    let a = store
        .generate_new_address(&generated.address, None, false, false)
        .unwrap();
    let b = store
        .generate_new_address(&generated.address, None, false, false)
        .unwrap();
    assert_eq!(a, b);
    assert!(!store.is_my_address(&a.address));
    assert_eq!(store.my_addresses().unwrap().len(), 1);
    assert_eq!(std::fs::read(store.path()).unwrap(), before);

    let committed = store
        .generate_new_address(&generated.address, None, true, false)
        .unwrap();
    assert_eq!(committed, a);
    assert!(store.is_my_address(&a.address));
    assert_eq!(store.nonce_for_address(&a.address).unwrap(), Some(a.nonce.clone()));
}

#[test]
fn test_hash_era_follows_wallet_version() {
    let dir = TempDir::new().unwrap();
    let path = wallet_path(&dir);
    let generated = storage_at(&path)
        .generate_with_version(PASSWORD, WalletVersion::V1)
        .unwrap();

    let store = storage_at(&path);
    store.load(PASSWORD).unwrap();
    let key_pair = store.key_pair(&generated.address).unwrap().unwrap();

    let next = store
        .generate_new_address(&generated.address, None, false, false)
        .unwrap();
    let quad = address_deriver::chain_step(
        HashVariant::Quad,
        &generated.address,
        &key_pair.base_nonce,
        None,
    );
    let square = address_deriver::chain_step(
        HashVariant::Square,
        &generated.address,
        &key_pair.base_nonce,
        None,
    );
    assert_eq!(next, quad);
    assert_ne!(next.address, square.address);
}

#[test]
fn test_load_replays_chain_to_checkpoint() {
    let dir = TempDir::new().unwrap();
    let path = wallet_path(&dir);

    let first = storage_at(&path);
    let generated = first.generate(PASSWORD).unwrap();
    let mut derived = Vec::new();
    for _ in 0..3 {
        derived.push(
            first
                .generate_new_address(&generated.address, None, true, true)
                .unwrap(),
        );
    }

    let store = storage_at(&path);
    store.load(PASSWORD).unwrap();
    for step in &derived {
        assert!(store.is_my_address(&step.address));
        assert_eq!(
            store.nonce_for_address(&step.address).unwrap(),
            Some(step.nonce.clone())
        );
    }
    assert_eq!(store.my_addresses().unwrap().len(), 4);
    assert_eq!(store.last_address().unwrap(), derived[2].address);

    // 继续派生接在检查点之后
    let next = store
        .generate_new_address(&generated.address, None, false, false)
        .unwrap();
    let expected = first
        .generate_new_address(&generated.address, None, false, false)
        .unwrap();
    assert_eq!(next, expected);
}

#[test]
fn test_unreachable_checkpoint_is_bounded() {
    let dir = TempDir::new().unwrap();
    let path = wallet_path(&dir);
    storage_at(&path).generate(PASSWORD).unwrap();

    // 换成链上不存在的 last nonce
    let bytes = std::fs::read(&path).unwrap();
    let WalletFile::SingleKey(mut record) = codec::decode(&bytes).unwrap() else {
        panic!("expected single key wallet");
    };
    let bogus = common::cipher()
        .encrypt_with_password(&[0xee; 16], PASSWORD, false)
        .unwrap();
    record.last_nonce = Some(bogus);
    std::fs::write(&path, codec::encode(&WalletFile::SingleKey(record)).unwrap()).unwrap();

    let mut config = settings(&path);
    config.max_catch_up_steps = 50;
    let store = storage_with(config);
    assert!(matches!(
        store.load(PASSWORD),
        Err(WalletError::CheckpointUnreachable { steps: 50 })
    ));
    assert!(!store.is_loaded());
}

#[test]
fn test_backup_is_first_write_wins() {
    let dir = TempDir::new().unwrap();
    let path = wallet_path(&dir);
    let generated = storage_at(&path).generate(PASSWORD).unwrap();

    let backup = dir
        .path()
        .join(format!("wallet.ixi.{}.bak", generated.address.wallet_id()));
    // 生成时已经备份过一次
    assert!(backup.exists());
    std::fs::remove_file(&backup).unwrap();

    let store = storage_at(&path);
    store.load(PASSWORD).unwrap();
    assert!(store.backup().unwrap());
    assert!(!store.backup().unwrap());
    assert_eq!(backup_count(&dir), 1);
    assert_eq!(std::fs::read(&backup).unwrap(), std::fs::read(&path).unwrap());
}

#[test]
fn test_backup_on_load() {
    let dir = TempDir::new().unwrap();
    let path = wallet_path(&dir);
    storage_at(&path).generate(PASSWORD).unwrap();
    for entry in std::fs::read_dir(dir.path()).unwrap() {
        let entry = entry.unwrap();
        if entry.file_name().to_string_lossy().ends_with(".bak") {
            std::fs::remove_file(entry.path()).unwrap();
        }
    }

    let mut config = settings(&path);
    config.backup_on_load = true;
    storage_with(config).load(PASSWORD).unwrap();
    assert_eq!(backup_count(&dir), 1);
}

#[test]
fn test_legacy_hex_migration() {
    let dir = TempDir::new().unwrap();
    let path = wallet_path(&dir);
    let generated = storage_at(&path).generate(PASSWORD).unwrap();
    let binary = std::fs::read(&path).unwrap();
    let legacy = format!("IXIHEX{}", hex::encode(&binary));
    std::fs::write(&path, &legacy).unwrap();

    // verify 只在内存中转换
    let store = storage_at(&path);
    store.verify(PASSWORD).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), legacy.as_bytes());

    store.load(PASSWORD).unwrap();
    assert_eq!(store.primary_address().unwrap(), generated.address);
    assert_eq!(std::fs::read(&path).unwrap(), binary);

    // 再次加载不再转换
    let again = storage_at(&path);
    again.load(PASSWORD).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), binary);
}

#[test]
fn test_weak_password_never_touches_disk() {
    let dir = TempDir::new().unwrap();
    let path = wallet_path(&dir);

    let store = storage_at(&path);
    assert!(matches!(
        store.generate("short"),
        Err(WalletError::WeakPassword { min: 10 })
    ));
    assert!(!path.exists());
    assert!(!store.is_loaded());

    store.generate(PASSWORD).unwrap();
    let before = std::fs::read(&path).unwrap();
    assert!(matches!(
        store.save("123456789"),
        Err(WalletError::WeakPassword { .. })
    ));
    assert!(matches!(
        store.export_view_only("123456789"),
        Err(WalletError::WeakPassword { .. })
    ));
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn test_password_floor_ignores_lower_setting() {
    let dir = TempDir::new().unwrap();
    let path = wallet_path(&dir);

    let mut config = settings(&path);
    config.min_password_length = 4;
    let store = storage_with(config);
    assert!(matches!(
        store.generate("short"),
        Err(WalletError::WeakPassword { min: 10 })
    ));
    assert!(!path.exists());

    store.generate(PASSWORD).unwrap();
    assert!(matches!(
        store.save("123456789"),
        Err(WalletError::WeakPassword { min: 10 })
    ));
}

#[test]
fn test_failed_write_rolls_back_new_address() {
    let dir = TempDir::new().unwrap();
    let path = wallet_path(&dir);
    let store = storage_at(&path);
    let generated = store.generate(PASSWORD).unwrap();

    // 临时文件位置被目录占用，写入必然失败
    std::fs::create_dir(dir.path().join("wallet.ixi.tmp")).unwrap();

    let preview = store
        .generate_new_address(&generated.address, None, false, false)
        .unwrap();
    assert!(matches!(
        store.generate_new_address(&generated.address, None, true, true),
        Err(WalletError::Io(_))
    ));
    assert!(!store.is_my_address(&preview.address));
    assert_eq!(store.last_address().unwrap(), generated.address);
    assert_eq!(
        store
            .generate_new_address(&generated.address, None, false, false)
            .unwrap(),
        preview
    );
}

#[test]
fn test_v3_key_pairs_persist() {
    let dir = TempDir::new().unwrap();
    let path = wallet_path(&dir);

    let first = storage_at(&path);
    let generated = first
        .generate_with_version(PASSWORD, WalletVersion::V3)
        .unwrap();
    let second = first.generate_new_key_pair(true).unwrap();
    let third = first.generate_new_key_pair(true).unwrap();
    assert_ne!(second.address, generated.address);
    assert_ne!(second.address, third.address);

    let derived = first
        .generate_new_address(&second.address, None, true, true)
        .unwrap();

    let store = storage_at(&path);
    store.load(PASSWORD).unwrap();
    assert_eq!(store.version().unwrap(), WalletVersion::V3);
    assert_eq!(store.key_count().unwrap(), 3);
    assert_eq!(store.primary_address().unwrap(), generated.address);
    assert_eq!(store.seed_hash().unwrap(), first.seed_hash().unwrap());
    assert!(store.is_my_address(&third.address));
    assert!(store.is_my_address(&derived.address));
    assert_eq!(
        store.address_entry(&derived.address).unwrap().unwrap().owner,
        second.address
    );
}

/// 生成一个有三把密钥的 v3 钱包，返回文件字节
fn three_key_wallet(path: &std::path::Path) -> Vec<u8> {
    let store = storage_at(path);
    store
        .generate_with_version(PASSWORD, WalletVersion::V3)
        .unwrap();
    store.generate_new_key_pair(true).unwrap();
    store.generate_new_key_pair(true).unwrap();
    std::fs::read(path).unwrap()
}

fn multi_key_record(bytes: &[u8]) -> codec::MultiKeyRecord {
    match codec::decode(bytes).unwrap() {
        WalletFile::MultiKey(record) => record,
        other => panic!("unexpected layout: {:?}", other),
    }
}

#[test]
fn test_truncated_v3_wallet_keeps_earlier_keys() {
    let dir = TempDir::new().unwrap();
    let path = wallet_path(&dir);
    let full = three_key_wallet(&path);
    let record = multi_key_record(&full);
    let derived_len = record.derived_master_seed.as_ref().unwrap().len();

    let complete = storage_at(&path);
    complete.load(PASSWORD).unwrap();
    let addresses: Vec<Address> = complete.my_addresses().unwrap();
    assert_eq!(addresses.len(), 3);

    // 砍掉派生种子和第三把密钥的尾部
    let cut = full.len() - (4 + derived_len) - 6;
    std::fs::write(&path, &full[..cut]).unwrap();

    let store = storage_at(&path);
    store.load(PASSWORD).unwrap();
    assert_eq!(store.key_count().unwrap(), 2);
    assert_eq!(store.primary_address().unwrap(), addresses[0]);
    assert!(store.is_my_address(&addresses[1]));
    assert!(!store.is_my_address(&addresses[2]));
    assert_eq!(store.seed_hash().unwrap(), complete.seed_hash().unwrap());

    // 保存后得到完整文件，派生种子回退为主种子
    store.save(PASSWORD).unwrap();
    let saved = multi_key_record(&std::fs::read(&path).unwrap());
    assert!(!saved.truncated);
    assert_eq!(saved.keys.len(), 2);
    let cipher = common::cipher();
    let master = cipher
        .decrypt_with_password(&saved.master_seed, PASSWORD, true)
        .unwrap();
    let derived = cipher
        .decrypt_with_password(saved.derived_master_seed.as_ref().unwrap(), PASSWORD, true)
        .unwrap();
    assert_eq!(derived, master);

    let reloaded = storage_at(&path);
    reloaded.load(PASSWORD).unwrap();
    assert_eq!(reloaded.key_count().unwrap(), 2);
    assert!(reloaded.is_my_address(&addresses[1]));
}

#[test]
fn test_v3_truncated_before_first_key_is_corrupt() {
    let dir = TempDir::new().unwrap();
    let path = wallet_path(&dir);
    let full = three_key_wallet(&path);
    let record = multi_key_record(&full);

    // version | masterSeed | keyCount | 第一把密钥的两个字节
    let cut = 4 + 4 + record.master_seed.len() + 4 + 2;
    std::fs::write(&path, &full[..cut]).unwrap();

    let store = storage_at(&path);
    assert!(matches!(
        store.load(PASSWORD),
        Err(WalletError::CorruptFile(_))
    ));
    assert!(!store.is_loaded());
}

#[test]
fn test_v3_damaged_key_record_fails_load() {
    let dir = TempDir::new().unwrap();
    let path = wallet_path(&dir);
    let mut record = multi_key_record(&three_key_wallet(&path));

    // 主种子仍能解开，第二把密钥的私钥密文被改坏
    let last = record.keys[1].private_key.len() - 1;
    record.keys[1].private_key[last] ^= 0xff;
    std::fs::write(&path, codec::encode(&WalletFile::MultiKey(record)).unwrap()).unwrap();

    let store = storage_at(&path);
    assert!(matches!(store.load(PASSWORD), Err(WalletError::WrongPassword)));
    assert!(!store.is_loaded());
}

#[test]
fn test_v3_failed_write_discards_key_pair() {
    let dir = TempDir::new().unwrap();
    let path = wallet_path(&dir);
    let store = storage_at(&path);
    store
        .generate_with_version(PASSWORD, WalletVersion::V3)
        .unwrap();

    std::fs::create_dir(dir.path().join("wallet.ixi.tmp")).unwrap();
    assert!(store.generate_new_key_pair(true).is_err());
    assert_eq!(store.key_count().unwrap(), 1);
}

#[test]
fn test_single_key_wallet_has_no_extra_key_pairs() {
    let dir = TempDir::new().unwrap();
    let store = storage_at(&wallet_path(&dir));
    let generated = store.generate(PASSWORD).unwrap();

    let summary = store.generate_new_key_pair(true).unwrap();
    assert_eq!(summary.address, generated.address);
    assert_eq!(store.key_count().unwrap(), 1);
}

#[test]
fn test_viewing_export_loads_as_viewing_wallet() {
    let dir = TempDir::new().unwrap();
    let path = wallet_path(&dir);

    let full = storage_at(&path);
    let generated = full.generate(PASSWORD).unwrap();
    for _ in 0..2 {
        full.generate_new_address(&generated.address, None, true, true)
            .unwrap();
    }
    let on_disk = std::fs::read(&path).unwrap();

    let snapshot = full.export_view_only(PASSWORD).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), on_disk);
    match codec::decode(&snapshot).unwrap() {
        WalletFile::SingleKey(record) => {
            assert_eq!(record.version, WalletVersion::V4);
            assert!(matches!(record.secret, KeySecret::BaseNonce(_)));
            assert!(record.last_nonce.is_some());
        }
        other => panic!("unexpected layout: {:?}", other),
    }

    let view_path = dir.path().join("view.ixi");
    std::fs::write(&view_path, &snapshot).unwrap();
    let view = storage_at(&view_path);
    view.load(PASSWORD).unwrap();

    assert!(view.is_viewing().unwrap());
    assert_eq!(view.version().unwrap(), WalletVersion::V4);
    assert_eq!(view.primary_address().unwrap(), generated.address);
    let full_set: HashSet<Address> = full.my_addresses().unwrap().into_iter().collect();
    let view_set: HashSet<Address> = view.my_addresses().unwrap().into_iter().collect();
    assert_eq!(full_set, view_set);
    assert!(matches!(
        view.primary_private_key(),
        Err(WalletError::ViewingWallet(_))
    ));

    // 只读钱包同样能继续派生并保存
    let next_view = view
        .generate_new_address(&generated.address, None, true, true)
        .unwrap();
    let next_full = full
        .generate_new_address(&generated.address, None, false, false)
        .unwrap();
    assert_eq!(next_view, next_full);

    let reloaded = storage_at(&view_path);
    reloaded.load(PASSWORD).unwrap();
    assert!(reloaded.is_viewing().unwrap());
    assert!(reloaded.is_my_address(&next_view.address));
}

#[test]
fn test_v1_wallet_refuses_view_only_export() {
    let dir = TempDir::new().unwrap();
    let store = storage_at(&wallet_path(&dir));
    let generated = store
        .generate_with_version(PASSWORD, WalletVersion::V1)
        .unwrap();
    store
        .generate_new_address(&generated.address, None, true, true)
        .unwrap();

    assert!(matches!(
        store.export_view_only(PASSWORD),
        Err(WalletError::ViewingWallet(_))
    ));
}

#[test]
fn test_v3_view_only_export_tracks_primary_chain() {
    let dir = TempDir::new().unwrap();
    let path = wallet_path(&dir);
    let full = storage_at(&path);
    let generated = full
        .generate_with_version(PASSWORD, WalletVersion::V3)
        .unwrap();
    let committed = full
        .generate_new_address(&generated.address, None, true, true)
        .unwrap();

    let view_path = dir.path().join("view.ixi");
    std::fs::write(&view_path, full.export_view_only(PASSWORD).unwrap()).unwrap();
    let view = storage_at(&view_path);
    view.load(PASSWORD).unwrap();

    assert!(view.is_viewing().unwrap());
    assert!(view.is_my_address(&committed.address));
    assert_eq!(
        view.generate_new_address(&generated.address, None, false, false)
            .unwrap(),
        full.generate_new_address(&generated.address, None, false, false)
            .unwrap()
    );
}

#[test]
fn test_concurrent_commits_and_previews() {
    let dir = TempDir::new().unwrap();
    let store = storage_at(&wallet_path(&dir));
    let generated = store.generate(PASSWORD).unwrap();
    let primary = &generated.address;
    let store = &store;

    let committed: Vec<Address> = std::thread::scope(|s| {
        let writers: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(move || {
                    (0..5)
                        .map(|_| {
                            store
                                .generate_new_address(primary, None, true, false)
                                .unwrap()
                                .address
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for _ in 0..4 {
            s.spawn(move || {
                for _ in 0..20 {
                    let preview = store
                        .generate_new_address(primary, None, false, false)
                        .unwrap();
                    assert_eq!(preview.nonce.len(), 16);
                    let _ = store.my_addresses().unwrap();
                }
            });
        }

        writers
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    let unique: HashSet<&Address> = committed.iter().collect();
    assert_eq!(unique.len(), 20);
    assert_eq!(store.my_addresses().unwrap().len(), 21);

    // 提交结果就是派生链的前 20 步
    let key_pair = store.key_pair(primary).unwrap().unwrap();
    let chain: HashSet<Address> =
        address_deriver::walk(HashVariant::Square, primary, &key_pair.base_nonce, None)
            .take(20)
            .map(|step| step.address)
            .collect();
    assert_eq!(chain, committed.into_iter().collect::<HashSet<_>>());
}

#[test]
fn test_raw_wallet_and_delete() {
    let dir = TempDir::new().unwrap();
    let path = wallet_path(&dir);
    let store = storage_at(&path);
    assert!(matches!(store.raw_wallet(), Err(WalletError::FileNotFound(_))));

    store.generate(PASSWORD).unwrap();
    assert_eq!(store.raw_wallet().unwrap(), std::fs::read(&path).unwrap());
    assert!(store.exists());

    assert!(store.delete().unwrap());
    assert!(!store.exists());
    // 内存状态不受影响
    assert!(store.is_loaded());
}
