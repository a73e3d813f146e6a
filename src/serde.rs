//! `serde` support for the [collections](crate::collections)
//!
//! Lists serialize as sequences, and [`BDictionary`] as a map. A [`SparseAList`] serializes as a
//! pair of its length and the sequence of `(index, item)` pairs that are set. Node limits aren't
//! part of the serialized form; deserialized collections use the defaults.

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};

use std::fmt;
use std::marker::PhantomData;

use crate::{AList, BDictionary, BList, SparseAList};

impl<T: Serialize> Serialize for AList<T> {
    fn serialize<Se: Serializer>(&self, serializer: Se) -> Result<Se::Ok, Se::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<T: Serialize> Serialize for BList<T> {
    fn serialize<Se: Serializer>(&self, serializer: Se) -> Result<Se::Ok, Se::Error> {
        serializer.collect_seq(self.as_tree().iter())
    }
}

impl<K: Serialize, V: Serialize> Serialize for BDictionary<K, V> {
    fn serialize<Se: Serializer>(&self, serializer: Se) -> Result<Se::Ok, Se::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<T: Serialize> Serialize for SparseAList<T> {
    fn serialize<Se: Serializer>(&self, serializer: Se) -> Result<Se::Ok, Se::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.len())?;
        tuple.serialize_element(&SetItems(self))?;
        tuple.end()
    }
}

struct SetItems<'a, T>(&'a SparseAList<T>);

impl<T: Serialize> Serialize for SetItems<'_, T> {
    fn serialize<Se: Serializer>(&self, serializer: Se) -> Result<Se::Ok, Se::Error> {
        serializer.collect_seq(self.0.iter_set())
    }
}

impl<'de, T: Deserialize<'de> + Clone> Deserialize<'de> for AList<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(AListVisitor { marker: PhantomData })
    }
}

struct AListVisitor<T> {
    marker: PhantomData<AList<T>>,
}

impl<'de, T: Deserialize<'de> + Clone> Visitor<'de> for AListVisitor<T> {
    type Value = AList<T>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a sequence of list items")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut this = AList::new();
        while let Some(item) = seq.next_element()? {
            this.push(item).map_err(de::Error::custom)?;
        }

        Ok(this)
    }
}

impl<'de, T: Deserialize<'de> + Clone + Ord> Deserialize<'de> for BList<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(BListVisitor { marker: PhantomData })
    }
}

struct BListVisitor<T> {
    marker: PhantomData<BList<T>>,
}

impl<'de, T: Deserialize<'de> + Clone + Ord> Visitor<'de> for BListVisitor<T> {
    type Value = BList<T>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a sequence of list items")
    }

    // Items are re-sorted as they're added, so the input doesn't need to be in order
    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut this = BList::new();
        while let Some(item) = seq.next_element()? {
            this.add(item).map_err(de::Error::custom)?;
        }

        Ok(this)
    }
}

impl<'de, K, V> Deserialize<'de> for BDictionary<K, V>
where
    K: Deserialize<'de> + Clone + Ord,
    V: Deserialize<'de> + Clone,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(BDictionaryVisitor { marker: PhantomData })
    }
}

struct BDictionaryVisitor<K, V> {
    marker: PhantomData<BDictionary<K, V>>,
}

impl<'de, K, V> Visitor<'de> for BDictionaryVisitor<K, V>
where
    K: Deserialize<'de> + Clone + Ord,
    V: Deserialize<'de> + Clone,
{
    type Value = BDictionary<K, V>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut this = BDictionary::new();
        while let Some((key, value)) = map.next_entry()? {
            if this.insert(key, value).map_err(de::Error::custom)?.is_some() {
                return Err(de::Error::custom("duplicate key in map"));
            }
        }

        Ok(this)
    }
}

impl<'de, T: Deserialize<'de> + Clone> Deserialize<'de> for SparseAList<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_tuple(2, SparseAListVisitor { marker: PhantomData })
    }
}

struct SparseAListVisitor<T> {
    marker: PhantomData<SparseAList<T>>,
}

impl<'de, T: Deserialize<'de> + Clone> Visitor<'de> for SparseAListVisitor<T> {
    type Value = SparseAList<T>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a length, followed by a sequence of (index, item) pairs")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let len: usize = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let items: Vec<(usize, T)> = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;

        let mut this = SparseAList::new();
        this.insert_space(0, len).map_err(de::Error::custom)?;

        let mut last = None;
        for (index, item) in items {
            if last.is_some_and(|l| index <= l) {
                return Err(de::Error::custom("set indexes must be strictly increasing"));
            }
            last = Some(index);
            this.set(index, item).map_err(de::Error::custom)?;
        }

        Ok(this)
    }
}
