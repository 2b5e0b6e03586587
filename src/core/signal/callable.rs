//! 可调用适配器
//!
//! 把两种接收形态统一到同一个调用约定 `call(args)` 之下：
//!
//! - **绑定方法**：接收者的弱引用 + 方法指针，可以按接收者或按（接收者, 方法）断开
//! - **闭包**：任意 `Fn(A)`，只能随信号销毁
//!
//! 参数列表用元组表示，`Signal<(u32, u32)>` 的绑定方法形如 `fn(&R, u32, u32)`。
//! 方法按路径（如 `Hud::on_score`）传入，每个方法项都有自己的类型，
//! 方法标识取自这个类型，函数体相同的两个方法也不会混淆。

use std::any::TypeId;
use std::sync::{Arc, Weak};

use super::receiver::{Receiver, ReceiverId, SenderTable};

/// 方法标识
///
/// 由方法项的类型得到，用于 `disconnect_method`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodId(TypeId);

impl MethodId {
    pub(crate) fn of<M: 'static>() -> Self {
        Self(TypeId::of::<M>())
    }
}

/// 信号参数列表
///
/// 为 `()` 到四元组实现，元素类型必须可复制（`Clone`）并可跨线程发送。
pub trait Args: Clone + Send + 'static {}

/// 可以连接到 `Signal<A>` 的接收者方法
///
/// 为所有形如 `Fn(&R, A1, ..)` 的可复制函数项实现，调用时展开参数元组。
///
/// 应直接传入方法路径。先转换成函数指针（`as fn(..)`）会让同签名的方法
/// 共享同一个标识。
pub trait SlotMethod<R, A: Args>: Copy + Send + Sync + 'static {
    /// 展开参数元组并调用方法
    fn invoke(&self, receiver: &R, args: A);
}

macro_rules! impl_args {
    ($($arg:ident),*) => {
        impl<$($arg),*> Args for ($($arg,)*)
        where
            $($arg: Clone + Send + 'static,)*
        {
        }

        impl<F, R, $($arg),*> SlotMethod<R, ($($arg,)*)> for F
        where
            F: Fn(&R $(, $arg)*) + Copy + Send + Sync + 'static,
            $($arg: Clone + Send + 'static,)*
        {
            #[allow(non_snake_case)]
            fn invoke(&self, receiver: &R, args: ($($arg,)*)) {
                let ($($arg,)*) = args;
                self(receiver $(, $arg)*)
            }
        }
    };
}

impl_args!();
impl_args!(A1);
impl_args!(A1, A2);
impl_args!(A1, A2, A3);
impl_args!(A1, A2, A3, A4);

/// 类型擦除后的可调用对象
pub(crate) enum Callable<A> {
    /// 绑定到接收者的方法
    Method {
        receiver: ReceiverId,
        method: MethodId,
        /// 接收者的发送者集合，信号析构时用于反向注销
        senders: Weak<SenderTable>,
        /// 接收者已销毁时返回 `false`
        invoke: Arc<dyn Fn(A) -> bool + Send + Sync>,
    },

    /// 任意闭包
    Closure(Arc<dyn Fn(A) + Send + Sync>),
}

impl<A: Args> Callable<A> {
    pub(crate) fn method<R, M>(receiver: &Arc<R>, method: M) -> Self
    where
        R: Receiver,
        M: SlotMethod<R, A>,
    {
        let target: Weak<R> = Arc::downgrade(receiver);
        let senders = receiver.senders();

        Callable::Method {
            receiver: senders.id(),
            method: MethodId::of::<M>(),
            senders: senders.table(),
            invoke: Arc::new(move |args: A| match target.upgrade() {
                Some(receiver) => {
                    method.invoke(&*receiver, args);
                    true
                }
                None => false,
            }),
        }
    }

    pub(crate) fn closure<F>(f: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Callable::Closure(Arc::new(f))
    }

    /// 调用，返回是否真正执行
    pub(crate) fn call(&self, args: A) -> bool {
        match self {
            Callable::Method { invoke, .. } => invoke(args),
            Callable::Closure(f) => {
                f(args);
                true
            }
        }
    }

    pub(crate) fn receiver(&self) -> Option<ReceiverId> {
        match self {
            Callable::Method { receiver, .. } => Some(*receiver),
            Callable::Closure(_) => None,
        }
    }

    pub(crate) fn method_id(&self) -> Option<MethodId> {
        match self {
            Callable::Method { method, .. } => Some(*method),
            Callable::Closure(_) => None,
        }
    }

    pub(crate) fn senders(&self) -> Option<&Weak<SenderTable>> {
        match self {
            Callable::Method { senders, .. } => Some(senders),
            Callable::Closure(_) => None,
        }
    }
}

// 手动实现，避免 derive 给 A 加上多余的约束
impl<A> Clone for Callable<A> {
    fn clone(&self) -> Self {
        match self {
            Callable::Method { receiver, method, senders, invoke } => Callable::Method {
                receiver: *receiver,
                method: *method,
                senders: senders.clone(),
                invoke: Arc::clone(invoke),
            },
            Callable::Closure(f) => Callable::Closure(Arc::clone(f)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::signal::Senders;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        senders: Senders,
        calls: Mutex<Vec<String>>,
    }

    impl Receiver for Recorder {
        fn senders(&self) -> &Senders {
            &self.senders
        }
    }

    impl Recorder {
        fn resized(&self, width: u32, height: u32) {
            self.calls.lock().unwrap().push(format!("resized {}x{}", width, height));
        }

        fn resized_twin(&self, width: u32, height: u32) {
            self.calls.lock().unwrap().push(format!("resized {}x{}", width, height));
        }

        fn moved(&self, x: i32, y: i32) {
            self.calls.lock().unwrap().push(format!("moved to ({}, {})", x, y));
        }

        fn labelled(&self, name: String, index: usize, visible: bool) {
            self.calls.lock().unwrap().push(format!("{}#{} visible={}", name, index, visible));
        }
    }

    #[test]
    fn test_method_call_unpacks_tuple() {
        let recorder = Arc::new(Recorder::default());

        let callable = Callable::<(u32, u32)>::method(&recorder, Recorder::resized);
        assert!(callable.call((1920, 1080)));

        let callable = Callable::<(String, usize, bool)>::method(&recorder, Recorder::labelled);
        assert!(callable.call(("cube".to_string(), 3, true)));

        assert_eq!(
            *recorder.calls.lock().unwrap(),
            vec!["resized 1920x1080".to_string(), "cube#3 visible=true".to_string()]
        );
    }

    #[test]
    fn test_method_identity() {
        let recorder = Arc::new(Recorder::default());
        let resized = Callable::<(u32, u32)>::method(&recorder, Recorder::resized);
        let resized_again = Callable::<(u32, u32)>::method(&recorder, Recorder::resized);
        let moved = Callable::<(i32, i32)>::method(&recorder, Recorder::moved);

        assert_eq!(resized.receiver(), Some(recorder.senders.id()));
        assert_eq!(resized.method_id(), resized_again.method_id());
        assert_ne!(resized.method_id(), moved.method_id());

        // 函数体相同的不同方法仍有不同的标识
        let twin = Callable::<(u32, u32)>::method(&recorder, Recorder::resized_twin);
        assert_ne!(resized.method_id(), twin.method_id());
        assert!(resized.senders().is_some());
    }

    #[test]
    fn test_method_skips_dropped_receiver() {
        let recorder = Arc::new(Recorder::default());
        let callable = Callable::<(u32, u32)>::method(&recorder, Recorder::resized);
        drop(recorder);

        assert!(!callable.call((800, 600)));
    }

    #[test]
    fn test_closure_has_no_identity() {
        let hits = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&hits);
        let callable = Callable::<()>::closure(move |()| *counter.lock().unwrap() += 1);

        assert!(callable.call(()));
        assert!(callable.clone().call(()));
        assert_eq!(*hits.lock().unwrap(), 2);
        assert_eq!(callable.receiver(), None);
        assert_eq!(callable.method_id(), None);
        assert!(callable.senders().is_none());
    }
}
