//! End-point scenarios driven through `VirtualObjectEndPoint`.
