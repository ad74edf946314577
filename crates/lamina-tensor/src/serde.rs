use crate::{
    device_marker::{CpuDevice, DeviceMarker},
    dia::DiaMatrix,
    layout::{LayoutKind, MemoryLayout},
    Tensor,
};

use serde::ser::SerializeStruct;
use serde::Deserialize;

impl<T, const N: usize, L, D> serde::Serialize for Tensor<T, N, L, D>
where
    T: serde::Serialize,
    L: MemoryLayout,
    D: CpuDevice,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("Tensor", 3)?;
        state.serialize_field("data", self.as_slice())?;
        state.serialize_field("shape", &self.shape.to_vec())?;
        state.serialize_field("layout", &L::KIND)?;
        state.end()
    }
}

impl<'de, T, const N: usize, L, D> serde::Deserialize<'de> for Tensor<T, N, L, D>
where
    T: serde::Deserialize<'de>,
    L: MemoryLayout,
    D: DeviceMarker,
{
    fn deserialize<De>(deserializer: De) -> Result<Self, De::Error>
    where
        De: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct TensorData<T> {
            data: Vec<T>,
            shape: Vec<usize>,
            layout: LayoutKind,
        }

        let TensorData {
            data,
            shape,
            layout,
        } = TensorData::deserialize(deserializer)?;

        if layout != L::KIND {
            return Err(serde::de::Error::custom(format!(
                "expected {:?} layout, got {:?}",
                L::KIND,
                layout
            )));
        }

        let shape: [usize; N] = shape
            .try_into()
            .map_err(|_| serde::de::Error::custom("Invalid shape"))?;

        Tensor::from_shape_vec(shape, data).map_err(serde::de::Error::custom)
    }
}

impl<T, D> serde::Serialize for DiaMatrix<T, D>
where
    T: serde::Serialize,
    D: CpuDevice,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("DiaMatrix", 4)?;
        state.serialize_field("height", &self.height())?;
        state.serialize_field("width", &self.width())?;
        state.serialize_field("offsets", self.offsets())?;
        state.serialize_field("data", self.as_slice())?;
        state.end()
    }
}

impl<'de, T, D> serde::Deserialize<'de> for DiaMatrix<T, D>
where
    T: serde::Deserialize<'de>,
    D: DeviceMarker,
{
    fn deserialize<De>(deserializer: De) -> Result<Self, De::Error>
    where
        De: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct DiaData<T> {
            height: usize,
            width: usize,
            offsets: Vec<isize>,
            data: Vec<T>,
        }

        let DiaData {
            height,
            width,
            offsets,
            data,
        } = DiaData::deserialize(deserializer)?;

        DiaMatrix::from_diagonals(height, width, offsets, data).map_err(serde::de::Error::custom)
    }
}
