use crate::{Field, LorentzVector};
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;

/// Written as the sequence `[t, x, y, z]`.
impl<T: Field + Serialize> Serialize for LorentzVector<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(4))?;
        seq.serialize_element(&self.t)?;
        seq.serialize_element(&self.x)?;
        seq.serialize_element(&self.y)?;
        seq.serialize_element(&self.z)?;
        seq.end()
    }
}
