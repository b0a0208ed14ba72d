use crate::{DType, Shape};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IOName(pub String);

#[derive(Clone, Debug)]
pub struct TensorSpec {
    pub name: IOName,
    pub dtype: DType,
    pub shape: Shape,
}

/// Declared I/O contract of a deployed model.
#[derive(Clone, Debug)]
pub struct ModelSpec {
    pub inputs: Vec<TensorSpec>,
    pub outputs: Vec<TensorSpec>,
}

impl ModelSpec {
    /// The fixed contract of the ResNet-18 classification bundle: one
    /// `data` input of NCHW images, one logits output over 1000 classes.
    pub fn resnet18(batch_size: usize) -> Self {
        ModelSpec {
            inputs: vec![TensorSpec {
                name: IOName("data".to_string()),
                dtype: DType::F32,
                shape: Shape::from_slice(&[batch_size, 3, 224, 224]),
            }],
            outputs: vec![TensorSpec {
                name: IOName("output".to_string()),
                dtype: DType::F32,
                shape: Shape::from_slice(&[batch_size, 1000]),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resnet18_contract() {
        let spec = ModelSpec::resnet18(1);
        assert_eq!(spec.inputs.len(), 1);
        assert_eq!(spec.inputs[0].name.0, "data");
        assert_eq!(spec.inputs[0].shape, Shape::from_slice(&[1, 3, 224, 224]));
        assert_eq!(spec.outputs[0].shape, Shape::from_slice(&[1, 1000]));
        assert_eq!(spec.inputs[0].dtype, DType::F32);
    }
}
