use bevy::asset::{io::Reader, ron, Asset, AssetLoader, LoadContext};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::marker::PhantomData;
use thiserror::Error;

use super::schema::{ItemList, StatisticList};

/// 通用 RON 资产加载器，按扩展名区分资产类型
pub struct RonAssetLoader<A> {
    extensions: &'static [&'static str],
    _marker: PhantomData<fn() -> A>,
}

impl<A> RonAssetLoader<A> {
    pub const fn new(extensions: &'static [&'static str]) -> Self {
        Self {
            extensions,
            _marker: PhantomData,
        }
    }
}

pub type RonItemLoader = RonAssetLoader<ItemList>;
pub type RonStatisticLoader = RonAssetLoader<StatisticList>;

pub const ITEM_EXTENSIONS: &[&str] = &["items.ron"];
pub const STATISTIC_EXTENSIONS: &[&str] = &["stats.ron"];

#[derive(Debug, Error)]
pub enum RonLoaderError {
    #[error("Could not load asset: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not parse RON: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("Could not interpret bytes as UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

impl<A> AssetLoader for RonAssetLoader<A>
where
    A: Asset + DeserializeOwned,
{
    type Asset = A;
    type Settings = ();
    type Error = RonLoaderError;

    fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        _load_context: &mut LoadContext,
    ) -> impl Future<Output = Result<Self::Asset, Self::Error>> + Send {
        async move {
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes).await?;

            let s = std::str::from_utf8(&bytes)?;
            let asset: A = ron::de::from_str(s)?;

            Ok(asset)
        }
    }

    fn extensions(&self) -> &[&str] {
        self.extensions
    }
}
