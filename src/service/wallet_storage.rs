//! 钱包持久化
//!
//! 负责钱包文件的加载、校验、保存、备份、删除和只读导出，以及在已加载钱包上
//! 派生新地址 / 新密钥。
//!
//! 状态机：`Unloaded -> Loaded`，加载后不可卸载。`generate` 是进入 Loaded 的另一条路径，
//! 与 `load` 互斥。
//!
//! 并发：钱包状态、密钥表和密码放在同一把读写锁下，提交派生与写文件在同一次
//! 写锁内完成，写失败时先回滚内存再释放锁。

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rand::RngCore;
use rust_decimal::Decimal;
use zeroize::Zeroizing;

use crate::codec::{
    self, legacy_hex, EncryptedKeyRecord, KeySecret, MultiKeyRecord, SingleKeyRecord, WalletFile,
};
use crate::config::{Config, WalletConfig};
use crate::domain::address::Address;
use crate::domain::funding::{FundingSet, PendingTransaction};
use crate::domain::key_pair::{AddressEntry, ChainStep, KeyPair, KeyPairSummary};
use crate::domain::wallet_state::{GeneratedWallet, WalletState};
use crate::domain::wallet_version::{Layout, WalletVersion};
use crate::error::{WalletError, WalletResult};
use crate::infrastructure::encryption::{AesGcmPasswordCipher, PasswordCipher};
use crate::infrastructure::hashing::{sha512_sq_trunc, HashVariant, SHA512_LEN};
use crate::infrastructure::key_provider::{
    Ed25519KeyProvider, KeyMaterial, KeyProvider, DEFAULT_KEY_SIZE,
};
use crate::infrastructure::ledger::LedgerOracle;
use crate::infrastructure::log_redact::{redact_bytes, SensitiveRedact};
use crate::infrastructure::password::{ensure_password_policy, Credential};
use crate::service::address_deriver;
use crate::service::funding_selector::FundingSelector;
use crate::service::key_store::KeyStore;

/// v3 主种子长度
pub const MASTER_SEED_LEN: usize = 64;

/// 已加载的钱包
struct OpenWallet {
    state: WalletState,
    keys: KeyStore,
    credential: Credential,
}

impl OpenWallet {
    fn primary(&self) -> WalletResult<&KeyPair> {
        self.keys
            .primary_key()
            .ok_or_else(|| WalletError::corrupt("wallet holds no keys"))
    }

    fn variant(&self) -> HashVariant {
        self.state.version.hash_variant()
    }
}

/// 按字段加解密，密码和加密强度在一次读写内固定
struct FieldCipher<'a> {
    cipher: &'a dyn PasswordCipher,
    password: &'a str,
    strengthened: bool,
}

impl FieldCipher<'_> {
    fn seal(&self, plaintext: &[u8]) -> WalletResult<Vec<u8>> {
        self.cipher
            .encrypt_with_password(plaintext, self.password, self.strengthened)
    }

    fn seal_opt(&self, plaintext: Option<&[u8]>) -> WalletResult<Option<Vec<u8>>> {
        plaintext.map(|p| self.seal(p)).transpose()
    }

    /// 任何字段解不出明文都视为密码错误
    fn open(&self, field: &'static str, ciphertext: &[u8]) -> WalletResult<Vec<u8>> {
        self.cipher
            .decrypt_with_password(ciphertext, self.password, self.strengthened)
            .ok_or_else(|| {
                tracing::warn!(field, "Unable to decrypt wallet, an incorrect password was used");
                WalletError::WrongPassword
            })
    }

    fn open_opt(
        &self,
        field: &'static str,
        ciphertext: Option<&[u8]>,
    ) -> WalletResult<Option<Vec<u8>>> {
        ciphertext.map(|c| self.open(field, c)).transpose()
    }

    /// v3 密钥记录字段；主种子已解开后再失败，多半是该条记录损坏
    fn open_key(
        &self,
        index: usize,
        field: &'static str,
        ciphertext: &[u8],
    ) -> WalletResult<Vec<u8>> {
        self.cipher
            .decrypt_with_password(ciphertext, self.password, self.strengthened)
            .ok_or_else(|| {
                tracing::warn!(
                    index,
                    field,
                    "Unable to decrypt wallet key, the password is wrong or the key record is damaged"
                );
                WalletError::WrongPassword
            })
    }
}

fn key_pair_from_material(keys: KeyMaterial, address: Address, variant: HashVariant) -> KeyPair {
    let base_nonce = address_deriver::base_nonce(variant, &keys.private_key, &keys.public_key);
    KeyPair {
        private_key: Some(keys.private_key),
        public_key: keys.public_key,
        address,
        base_nonce: Zeroizing::new(base_nonce),
        last_nonce: None,
    }
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// 先写临时文件再 rename，避免写到一半的钱包文件
fn write_atomically(path: &Path, bytes: &[u8]) -> WalletResult<()> {
    let tmp = sibling_path(path, ".tmp");
    fs::write(&tmp, bytes)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

pub struct WalletStorage {
    path: PathBuf,
    settings: WalletConfig,
    cipher: Arc<dyn PasswordCipher>,
    key_provider: Arc<dyn KeyProvider>,
    inner: RwLock<Option<OpenWallet>>,
}

impl std::fmt::Debug for WalletStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletStorage")
            .field("path", &self.path)
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

impl WalletStorage {
    pub fn new(
        settings: WalletConfig,
        cipher: Arc<dyn PasswordCipher>,
        key_provider: Arc<dyn KeyProvider>,
    ) -> Self {
        Self {
            path: settings.path.clone(),
            settings,
            cipher,
            key_provider,
            inner: RwLock::new(None),
        }
    }

    /// 使用默认协作方（AES-GCM 密码加密 + Ed25519 密钥）
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.wallet.clone(),
            Arc::new(AesGcmPasswordCipher::new(config.crypto.clone())),
            Arc::new(Ed25519KeyProvider),
        )
    }

    fn read_inner(&self) -> RwLockReadGuard<'_, Option<OpenWallet>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_inner(&self) -> RwLockWriteGuard<'_, Option<OpenWallet>> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    fn with_wallet<T>(&self, f: impl FnOnce(&OpenWallet) -> T) -> WalletResult<T> {
        let guard = self.read_inner();
        guard.as_ref().map(f).ok_or(WalletError::NotLoaded)
    }

    fn field_cipher<'a>(&'a self, password: &'a str, strengthened: bool) -> FieldCipher<'a> {
        FieldCipher {
            cipher: self.cipher.as_ref(),
            password,
            strengthened,
        }
    }

    // ========== 文件生命周期 ==========

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn is_loaded(&self) -> bool {
        self.read_inner().is_some()
    }

    /// 加载钱包文件
    ///
    /// 旧的 IXIHEX 文件先在磁盘上原地转换为二进制
    pub fn load(&self, password: &str) -> WalletResult<()> {
        let mut guard = self.write_inner();
        if guard.is_some() {
            return Err(WalletError::AlreadyLoaded);
        }
        if !self.exists() {
            return Err(WalletError::FileNotFound(self.path.clone()));
        }

        tracing::info!(path = %self.path.display(), "Reading wallet file");
        legacy_hex::migrate_in_place(&self.path)?;
        let bytes = fs::read(&self.path)?;
        let file = codec::decode(&bytes)?;
        let wallet = self.open(&file, password)?;

        tracing::info!(
            version = %wallet.state.version,
            viewing = wallet.state.viewing,
            keys = wallet.keys.key_count(),
            addresses = wallet.keys.my_addresses().len(),
            primary = %wallet.state.primary_address.redact(),
            "Wallet loaded"
        );
        *guard = Some(wallet);
        drop(guard);

        if self.settings.backup_on_load {
            if let Err(e) = self.backup() {
                tracing::warn!(error = %e, "Unable to create wallet backup");
            }
        }
        Ok(())
    }

    /// 只读校验密码：完整走一遍解码和解密，不改变内存和磁盘状态
    pub fn verify(&self, password: &str) -> WalletResult<()> {
        if !self.exists() {
            return Err(WalletError::FileNotFound(self.path.clone()));
        }
        let bytes = fs::read(&self.path)?;
        let bytes = legacy_hex::normalize(&bytes)?;
        let file = codec::decode(&bytes)?;
        self.open(&file, password).map(|_| ())
    }

    /// 用新密码重写钱包文件
    pub fn save(&self, password: &str) -> WalletResult<()> {
        ensure_password_policy(password, self.settings.min_password_length)?;

        let mut guard = self.write_inner();
        let wallet = guard.as_mut().ok_or(WalletError::NotLoaded)?;
        self.write_wallet(wallet, password)?;
        wallet.credential = Credential::new(password);
        tracing::info!(path = %self.path.display(), "Wallet saved");
        Ok(())
    }

    /// 复制到 `<path>.<wallet id>.bak`，已存在时不覆盖并返回 false
    pub fn backup(&self) -> WalletResult<bool> {
        let wallet_id = self.with_wallet(|w| w.state.primary_address.wallet_id())?;
        let target = sibling_path(&self.path, &format!(".{}.bak", wallet_id));

        let mut destination = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                tracing::debug!(backup = %target.display(), "Wallet backup already exists");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        let copied = fs::File::open(&self.path)
            .and_then(|mut source| std::io::copy(&mut source, &mut destination));
        if let Err(e) = copied {
            drop(destination);
            let _ = fs::remove_file(&target);
            return Err(e.into());
        }

        tracing::info!(backup = %target.display(), "Wallet backup created");
        Ok(true)
    }

    /// 只删除磁盘文件，返回是否删除了文件
    pub fn delete(&self) -> WalletResult<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "Wallet file deleted");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn raw_wallet(&self) -> WalletResult<Vec<u8>> {
        if !self.exists() {
            return Err(WalletError::FileNotFound(self.path.clone()));
        }
        Ok(fs::read(&self.path)?)
    }

    /// 导出 v4 只读钱包快照（base nonce + 公钥 + last nonce），不写磁盘
    ///
    /// v4 按两轮哈希派生，v1 的四轮派生链无法在快照中复现，因此拒绝导出
    pub fn export_view_only(&self, password: &str) -> WalletResult<Vec<u8>> {
        ensure_password_policy(password, self.settings.min_password_length)?;

        let guard = self.read_inner();
        let wallet = guard.as_ref().ok_or(WalletError::NotLoaded)?;
        if wallet.variant() != WalletVersion::V4.hash_variant() {
            tracing::warn!(version = %wallet.state.version, "Refusing view-only export");
            return Err(WalletError::ViewingWallet("v1 wallets cannot be exported as v4"));
        }
        let primary = wallet.primary()?;
        let fields = self.field_cipher(password, false);

        let record = SingleKeyRecord {
            version: WalletVersion::V4,
            secret: KeySecret::BaseNonce(fields.seal(&primary.base_nonce)?),
            public_key: fields.seal(&primary.public_key)?,
            last_nonce: fields.seal_opt(primary.last_nonce.as_deref())?,
        };
        codec::encode(&WalletFile::SingleKey(record))
    }

    // ========== 生成 ==========

    /// 生成新的 v2 钱包
    pub fn generate(&self, password: &str) -> WalletResult<GeneratedWallet> {
        self.generate_with_version(password, WalletVersion::V2)
    }

    pub fn generate_with_version(
        &self,
        password: &str,
        version: WalletVersion,
    ) -> WalletResult<GeneratedWallet> {
        ensure_password_policy(password, self.settings.min_password_length)?;

        let mut guard = self.write_inner();
        if guard.is_some() {
            return Err(WalletError::AlreadyLoaded);
        }

        tracing::info!(%version, "Generating primary wallet keys");
        let wallet = match version.layout() {
            Layout::SingleKey => self.fresh_single_key(version, password)?,
            Layout::MultiKey => self.fresh_multi_key(password)?,
        };

        if self.exists() {
            tracing::warn!(path = %self.path.display(), "Overwriting existing wallet file");
        }
        self.write_wallet(&wallet, password)?;

        let primary = wallet.primary()?;
        let generated = GeneratedWallet {
            version,
            address: primary.address.clone(),
            public_key: primary.public_key.clone(),
        };
        tracing::info!(primary = %generated.address.redact(), "New wallet generated");

        *guard = Some(wallet);
        drop(guard);

        if let Err(e) = self.backup() {
            tracing::warn!(error = %e, "Unable to create wallet backup");
        }
        Ok(generated)
    }

    fn fresh_single_key(&self, version: WalletVersion, password: &str) -> WalletResult<OpenWallet> {
        let keys = self
            .key_provider
            .generate_keys(DEFAULT_KEY_SIZE)
            .ok_or_else(|| {
                tracing::error!("Error creating wallet, unable to generate a new keypair");
                WalletError::DerivationFailure("key provider returned no key pair".into())
            })?;
        let address = Address::from_public_key(&keys.public_key).ok_or_else(|| {
            WalletError::DerivationFailure("generated public key has no address".into())
        })?;

        let key_pair = key_pair_from_material(keys, address.clone(), version.hash_variant());
        let state = WalletState::single_key(version, false, address, key_pair.base_nonce.to_vec());
        let mut keys = KeyStore::new();
        keys.insert_key(key_pair);

        Ok(OpenWallet {
            state,
            keys,
            credential: Credential::new(password),
        })
    }

    fn fresh_multi_key(&self, password: &str) -> WalletResult<OpenWallet> {
        let mut master_seed = Zeroizing::new(vec![0u8; MASTER_SEED_LEN]);
        rand::thread_rng().fill_bytes(&mut master_seed[..]);

        let (material, address) =
            address_deriver::derive_child_key(self.key_provider.as_ref(), &master_seed, 0)?;
        let key_pair = key_pair_from_material(material, address.clone(), HashVariant::Square);

        let state = WalletState {
            version: WalletVersion::V3,
            viewing: false,
            derived_master_seed: master_seed.clone(),
            seed_hash: sha512_sq_trunc(&master_seed, 0, 0, SHA512_LEN),
            master_seed,
            primary_address: address,
            base_nonce: key_pair.base_nonce.clone(),
        };
        let mut keys = KeyStore::new();
        keys.insert_key(key_pair);

        Ok(OpenWallet {
            state,
            keys,
            credential: Credential::new(password),
        })
    }

    // ========== 解密 / 加密 ==========

    fn open(&self, file: &WalletFile, password: &str) -> WalletResult<OpenWallet> {
        tracing::debug!(version = %file.version(), "Decrypting wallet");
        match file {
            WalletFile::SingleKey(record) => self.open_single_key(record, password),
            WalletFile::MultiKey(record) => self.open_multi_key(record, password),
        }
    }

    fn open_single_key(&self, record: &SingleKeyRecord, password: &str) -> WalletResult<OpenWallet> {
        let version = record.version;
        let variant = version.hash_variant();
        let fields = self.field_cipher(password, version.strengthened_encryption());

        let (private_key, stored_base_nonce) = match &record.secret {
            KeySecret::PrivateKey(c) => (Some(Zeroizing::new(fields.open("private key", c)?)), None),
            KeySecret::BaseNonce(c) => (None, Some(fields.open("base nonce", c)?)),
        };
        let public_key = fields.open("public key", &record.public_key)?;
        let checkpoint = fields.open_opt("last nonce", record.last_nonce.as_deref())?;

        let base_nonce = match (stored_base_nonce, &private_key) {
            (Some(base_nonce), _) => base_nonce,
            (None, Some(private_key)) => {
                address_deriver::base_nonce(variant, private_key, &public_key)
            }
            (None, None) => return Err(WalletError::corrupt("wallet holds no key material")),
        };

        let address = Address::from_public_key(&public_key)
            .ok_or_else(|| WalletError::corrupt("public key is empty"))?;

        let mut keys = KeyStore::new();
        keys.insert_key(KeyPair {
            private_key,
            public_key,
            address: address.clone(),
            base_nonce: Zeroizing::new(base_nonce.clone()),
            last_nonce: None,
        });
        if let Some(checkpoint) = checkpoint {
            keys.catch_up(&address, variant, &checkpoint, self.settings.max_catch_up_steps)?;
        }

        Ok(OpenWallet {
            state: WalletState::single_key(version, record.is_viewing(), address, base_nonce),
            keys,
            credential: Credential::new(password),
        })
    }

    fn open_multi_key(&self, record: &MultiKeyRecord, password: &str) -> WalletResult<OpenWallet> {
        let fields = self.field_cipher(password, true);
        let variant = WalletVersion::V3.hash_variant();

        let master_seed = Zeroizing::new(fields.open("master seed", &record.master_seed)?);
        let seed_hash = sha512_sq_trunc(&master_seed, 0, 0, SHA512_LEN);

        let mut keys = KeyStore::new();
        for (index, encrypted) in record.keys.iter().enumerate() {
            let material = KeyMaterial {
                private_key: Zeroizing::new(fields.open_key(
                    index,
                    "private key",
                    &encrypted.private_key,
                )?),
                public_key: fields.open_key(index, "public key", &encrypted.public_key)?,
            };
            let checkpoint = encrypted
                .nonce
                .as_deref()
                .map(|c| fields.open_key(index, "nonce", c))
                .transpose()?;

            let Some(address) = Address::from_public_key(&material.public_key) else {
                tracing::warn!(index, "Skipping wallet key with an empty public key");
                continue;
            };
            if !keys.insert_key(key_pair_from_material(material, address.clone(), variant)) {
                tracing::warn!(index, address = %address.redact(), "Skipping duplicate wallet key");
                continue;
            }
            if let Some(checkpoint) = checkpoint {
                keys.catch_up(&address, variant, &checkpoint, self.settings.max_catch_up_steps)?;
            }
        }

        let derived_master_seed = match (&record.derived_master_seed, record.truncated) {
            (Some(c), false) => Zeroizing::new(fields.open("derived master seed", c)?),
            _ => {
                tracing::warn!(
                    recovered = keys.key_count(),
                    "Wallet key list is truncated, continuing with the keys that were read"
                );
                master_seed.clone()
            }
        };

        let primary = keys
            .primary_key()
            .ok_or_else(|| WalletError::corrupt("wallet contains no usable keys"))?;
        let state = WalletState {
            version: WalletVersion::V3,
            viewing: false,
            primary_address: primary.address.clone(),
            base_nonce: primary.base_nonce.clone(),
            master_seed,
            derived_master_seed,
            seed_hash,
        };

        Ok(OpenWallet {
            state,
            keys,
            credential: Credential::new(password),
        })
    }

    fn seal(&self, wallet: &OpenWallet, password: &str) -> WalletResult<WalletFile> {
        let state = &wallet.state;
        let fields = self.field_cipher(password, state.version.strengthened_encryption());

        match state.version.layout() {
            Layout::SingleKey => {
                let primary = wallet.primary()?;
                let secret = match &primary.private_key {
                    Some(private_key) => KeySecret::PrivateKey(fields.seal(private_key)?),
                    None => KeySecret::BaseNonce(fields.seal(&primary.base_nonce)?),
                };
                Ok(WalletFile::SingleKey(SingleKeyRecord {
                    version: state.version,
                    secret,
                    public_key: fields.seal(&primary.public_key)?,
                    last_nonce: fields.seal_opt(primary.last_nonce.as_deref())?,
                }))
            }
            Layout::MultiKey => {
                let keys = wallet
                    .keys
                    .keys()
                    .map(|key_pair| -> WalletResult<EncryptedKeyRecord> {
                        let private_key = key_pair.private_key.as_ref().ok_or(
                            WalletError::ViewingWallet("multi-key wallets cannot hold viewing keys"),
                        )?;
                        Ok(EncryptedKeyRecord {
                            private_key: fields.seal(private_key)?,
                            public_key: fields.seal(&key_pair.public_key)?,
                            nonce: fields.seal_opt(key_pair.last_nonce.as_deref())?,
                        })
                    })
                    .collect::<WalletResult<Vec<_>>>()?;

                Ok(WalletFile::MultiKey(MultiKeyRecord {
                    master_seed: fields.seal(&state.master_seed)?,
                    keys,
                    derived_master_seed: Some(fields.seal(&state.derived_master_seed)?),
                    truncated: false,
                }))
            }
        }
    }

    fn write_wallet(&self, wallet: &OpenWallet, password: &str) -> WalletResult<()> {
        let file = self.seal(wallet, password)?;
        let bytes = codec::encode(&file)?;
        write_atomically(&self.path, &bytes)
    }

    /// 用当前密码写回
    fn persist(&self, wallet: &OpenWallet) -> WalletResult<()> {
        wallet
            .credential
            .ensure_writable(self.settings.min_password_length)?;
        self.write_wallet(wallet, wallet.credential.as_str())
    }

    // ========== 派生 ==========

    /// 派生 `primary` 链上的下一个地址
    ///
    /// `commit = false` 时只预览；`write_to_file` 失败时提交被撤销
    pub fn generate_new_address(
        &self,
        primary: &Address,
        last_nonce: Option<&[u8]>,
        commit: bool,
        write_to_file: bool,
    ) -> WalletResult<ChainStep> {
        if !commit {
            let guard = self.read_inner();
            let wallet = guard.as_ref().ok_or(WalletError::NotLoaded)?;
            return wallet.keys.preview_address(primary, wallet.variant(), last_nonce);
        }

        let mut guard = self.write_inner();
        let wallet = guard.as_mut().ok_or(WalletError::NotLoaded)?;
        let variant = wallet.variant();
        let (step, undo) = wallet
            .keys
            .commit_address_with_undo(primary, variant, last_nonce)?;

        if write_to_file {
            if let Err(e) = self.persist(wallet) {
                tracing::error!(error = %e, "Unable to write wallet, discarding new address");
                wallet.keys.undo_address(undo);
                return Err(e);
            }
        }

        tracing::debug!(
            address = %step.address.redact(),
            nonce = %redact_bytes(&step.nonce),
            "New address committed"
        );
        Ok(step)
    }

    /// v3 钱包从主种子派生下一把密钥；其他版本只返回主密钥
    pub fn generate_new_key_pair(&self, write_to_file: bool) -> WalletResult<KeyPairSummary> {
        let mut guard = self.write_inner();
        let wallet = guard.as_mut().ok_or(WalletError::NotLoaded)?;

        if wallet.state.version != WalletVersion::V3 {
            tracing::debug!(version = %wallet.state.version, "Only v3 wallets hold multiple keys");
            return Ok(wallet.primary()?.summary());
        }

        let index = u32::try_from(wallet.keys.key_count())
            .map_err(|_| WalletError::DerivationFailure("key index overflow".into()))?;
        let (material, address) = address_deriver::derive_child_key(
            self.key_provider.as_ref(),
            &wallet.state.master_seed,
            index,
        )?;
        let key_pair = key_pair_from_material(material, address, wallet.variant());
        let summary = key_pair.summary();

        if !wallet.keys.insert_key(key_pair) {
            return Err(WalletError::DerivationFailure(format!(
                "derived key #{} is already present",
                index
            )));
        }

        if write_to_file {
            if let Err(e) = self.persist(wallet) {
                tracing::error!(error = %e, index, "Unable to write wallet, discarding new key pair");
                wallet.keys.pop_key();
                return Err(e);
            }
        }

        tracing::info!(index, address = %summary.address.redact(), "New key pair derived");
        Ok(summary)
    }

    /// 找回丢失的地址：在每把密钥已提交 nonce 之后预览 `scan_window` 个地址，
    /// 有余额的地址及其之前的地址全部提交，并从那里重新开始扫描
    ///
    /// 返回找回的地址数量，有找回时写回文件
    pub fn scan_for_lost_addresses(&self, ledger: &dyn LedgerOracle) -> WalletResult<usize> {
        let mut guard = self.write_inner();
        let wallet = guard.as_mut().ok_or(WalletError::NotLoaded)?;
        let variant = wallet.variant();
        let window = self.settings.scan_window;

        let mut recovered = 0;
        for owner in wallet.keys.key_addresses() {
            loop {
                let hit = {
                    let key_pair = wallet
                        .keys
                        .key_pair(&owner)
                        .ok_or_else(|| WalletError::UnknownKey(owner.to_base58()))?;
                    address_deriver::walk(
                        variant,
                        &owner,
                        &key_pair.base_nonce,
                        key_pair.last_nonce.clone(),
                    )
                    .take(window)
                    .position(|step| ledger.get_balance(&step.address) > Decimal::ZERO)
                };

                let Some(index) = hit else { break };
                for _ in 0..=index {
                    wallet.keys.commit_address(&owner, variant, None)?;
                }
                recovered += index + 1;
            }
        }

        if recovered > 0 {
            tracing::info!(recovered, "Recovered lost addresses");
            self.persist(wallet)?;
        }
        Ok(recovered)
    }

    // ========== 查询 ==========

    pub fn is_valid_password(&self, password: &str) -> bool {
        self.read_inner()
            .as_ref()
            .map_or(false, |w| w.credential.matches(password))
    }

    pub fn version(&self) -> WalletResult<WalletVersion> {
        self.with_wallet(|w| w.state.version)
    }

    pub fn is_viewing(&self) -> WalletResult<bool> {
        self.with_wallet(|w| w.state.viewing)
    }

    pub fn primary_address(&self) -> WalletResult<Address> {
        self.with_wallet(|w| w.state.primary_address.clone())
    }

    pub fn primary_public_key(&self) -> WalletResult<Vec<u8>> {
        self.with_wallet(|w| w.primary().map(|k| k.public_key.clone()))?
    }

    pub fn primary_private_key(&self) -> WalletResult<Zeroizing<Vec<u8>>> {
        self.with_wallet(|w| {
            w.primary()?
                .private_key
                .clone()
                .ok_or(WalletError::ViewingWallet("viewing wallets hold no private key"))
        })?
    }

    pub fn seed_hash(&self) -> WalletResult<Vec<u8>> {
        self.with_wallet(|w| w.state.seed_hash.clone())
    }

    pub fn last_address(&self) -> WalletResult<Address> {
        self.with_wallet(|w| {
            w.keys
                .last_address()
                .cloned()
                .unwrap_or_else(|| w.state.primary_address.clone())
        })
    }

    pub fn key_count(&self) -> WalletResult<usize> {
        self.with_wallet(|w| w.keys.key_count())
    }

    pub fn key_pair(&self, address: &Address) -> WalletResult<Option<KeyPair>> {
        self.with_wallet(|w| w.keys.key_pair(address).cloned())
    }

    pub fn address_entry(&self, address: &Address) -> WalletResult<Option<AddressEntry>> {
        self.with_wallet(|w| w.keys.address_entry(address).cloned())
    }

    pub fn nonce_for_address(&self, address: &Address) -> WalletResult<Option<Vec<u8>>> {
        self.with_wallet(|w| w.keys.nonce_for_address(address).map(<[u8]>::to_vec))
    }

    pub fn is_my_address(&self, address: &Address) -> bool {
        self.with_wallet(|w| w.keys.is_mine(address))
            .unwrap_or(false)
    }

    pub fn my_addresses(&self) -> WalletResult<Vec<Address>> {
        self.with_wallet(|w| w.keys.my_addresses())
    }

    pub fn my_addresses_base58(&self) -> WalletResult<Vec<String>> {
        self.with_wallet(|w| w.keys.my_addresses_base58())
    }

    pub fn extract_my_addresses(&self, candidates: &[Address]) -> WalletResult<Option<Vec<Address>>> {
        self.with_wallet(|w| w.keys.extract_my_addresses(candidates))
    }

    /// 余额汇总，`primary` 为 None 时统计所有地址
    pub fn total_balance(
        &self,
        ledger: &dyn LedgerOracle,
        primary: Option<&Address>,
    ) -> WalletResult<Decimal> {
        self.with_wallet(|w| w.keys.total_balance(ledger, primary))
    }

    // ========== 资金选择 ==========

    /// 从 `primary` 名下的地址中凑出恰好 `total` 的资金
    pub fn build_funding_set(
        &self,
        ledger: &dyn LedgerOracle,
        primary: &Address,
        total: Decimal,
        skip: &[Address],
        pending: &[PendingTransaction],
    ) -> WalletResult<FundingSet> {
        let candidates = self.with_wallet(|w| {
            w.keys
                .key_pair(primary)
                .map(|_| w.keys.addresses_owned_by(primary))
        })?;
        let candidates = candidates.ok_or_else(|| WalletError::UnknownKey(primary.to_base58()))?;

        FundingSelector::new(ledger).select(candidates, total, skip, pending)
    }

    /// 单条目资金：`attribute` 为 true 时记在 `from` 名下，否则记在零长度键下
    pub fn funding_from_address(
        &self,
        from: &Address,
        total: Decimal,
        attribute: bool,
    ) -> WalletResult<FundingSet> {
        if !attribute {
            return Ok(FundingSet::unattributed(total));
        }
        if !self.with_wallet(|w| w.keys.is_mine(from))? {
            return Err(WalletError::UnknownKey(from.to_base58()));
        }
        let mut funding = FundingSet::default();
        funding.insert(from.clone(), total);
        Ok(funding)
    }
}
