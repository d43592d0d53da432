//! Flat parameter tensor with an attached gradient buffer
//!
//! Clones share storage, so a model and an optimizer can hold the same
//! parameter and both observe in-place updates. The whole pipeline is
//! single-threaded, so interior mutability via `RefCell` is sufficient.

use ndarray::Array1;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

struct TensorInner {
    data: Array1<f32>,
    grad: Option<Array1<f32>>,
    requires_grad: bool,
}

/// A 1-D parameter tensor with optional gradient storage
#[derive(Clone)]
pub struct Tensor {
    inner: Rc<RefCell<TensorInner>>,
}

impl Tensor {
    /// Create a tensor from raw values
    pub fn from_vec(data: Vec<f32>, requires_grad: bool) -> Self {
        Self {
            inner: Rc::new(RefCell::new(TensorInner {
                data: Array1::from_vec(data),
                grad: None,
                requires_grad,
            })),
        }
    }

    /// Create a zero-filled tensor
    pub fn zeros(len: usize, requires_grad: bool) -> Self {
        Self::from_vec(vec![0.0; len], requires_grad)
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.inner.borrow().data.len()
    }

    /// Whether the tensor has no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether gradients are tracked for this tensor
    pub fn requires_grad(&self) -> bool {
        self.inner.borrow().requires_grad
    }

    /// Borrow the underlying values
    pub fn data(&self) -> Ref<'_, Array1<f32>> {
        Ref::map(self.inner.borrow(), |inner| &inner.data)
    }

    /// Mutably borrow the underlying values
    pub fn data_mut(&self) -> RefMut<'_, Array1<f32>> {
        RefMut::map(self.inner.borrow_mut(), |inner| &mut inner.data)
    }

    /// Copy the values out
    pub fn to_vec(&self) -> Vec<f32> {
        self.inner.borrow().data.to_vec()
    }

    /// Replace the values in place (length must match)
    pub fn set_data(&self, data: Vec<f32>) {
        let mut inner = self.inner.borrow_mut();
        assert_eq!(inner.data.len(), data.len(), "tensor length is fixed");
        inner.data = Array1::from_vec(data);
    }

    /// Current gradient, if any
    pub fn grad(&self) -> Option<Array1<f32>> {
        self.inner.borrow().grad.clone()
    }

    /// Overwrite the gradient
    pub fn set_grad(&self, grad: Array1<f32>) {
        self.inner.borrow_mut().grad = Some(grad);
    }

    /// Add into the gradient, initializing it if absent
    pub fn accumulate_grad(&self, grad: &Array1<f32>) {
        let mut inner = self.inner.borrow_mut();
        match &mut inner.grad {
            Some(existing) => *existing += grad,
            None => inner.grad = Some(grad.clone()),
        }
    }

    /// Clear the gradient
    pub fn zero_grad(&self) {
        self.inner.borrow_mut().grad = None;
    }
}

impl std::fmt::Debug for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Tensor")
            .field("len", &inner.data.len())
            .field("requires_grad", &inner.requires_grad)
            .field("has_grad", &inner.grad.is_some())
            .finish()
    }
}
